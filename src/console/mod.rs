//! Console presentation layer. Renders the view-model snapshots as ASCII
//! tables and drives the whole core through an interactive command loop; it
//! never calls the API directly for identity or enrollment concerns.

mod repl;

pub use repl::Console;

use terminal_size::{terminal_size, Width};

use crate::models::{Course, Enrollment, EnrollmentStatus, Identity};

fn term_width() -> usize {
    if let Some((Width(w), _)) = terminal_size() {
        return (w.saturating_sub(4)) as usize;
    }
    80
}

fn clip(s: &str, maxw: usize) -> String {
    if s.chars().count() <= maxw {
        return s.to_string();
    }
    let mut out: String = s.chars().take(maxw.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn build_separator(widths: &[usize]) -> String {
    let mut line = String::from("+");
    for w in widths {
        line.push_str(&"-".repeat(w + 2));
        line.push('+');
    }
    line
}

fn build_row(cells: &[String], widths: &[usize]) -> String {
    let mut line = String::from("|");
    for (cell, w) in cells.iter().zip(widths.iter()) {
        line.push(' ');
        line.push_str(cell);
        line.push_str(&" ".repeat(w.saturating_sub(cell.chars().count())));
        line.push_str(" |");
    }
    line
}

/// Print a bordered table, capping each column so the whole row fits the
/// terminal. Returns the number of rows printed.
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) -> usize {
    // Cap per-column width by an even share of the terminal
    let max_col = (term_width() / headers.len().max(1)).max(8);
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count().min(max_col)).collect();
    let mut clipped: Vec<Vec<String>> = Vec::with_capacity(rows.len());
    for row in rows {
        let cells: Vec<String> = row.iter().map(|c| clip(c, max_col)).collect();
        for (i, cell) in cells.iter().enumerate().take(widths.len()) {
            let w = cell.chars().count();
            if w > widths[i] {
                widths[i] = w;
            }
        }
        clipped.push(cells);
    }

    let sep = build_separator(&widths);
    let head: Vec<String> = headers.iter().map(|h| clip(h, max_col)).collect();
    println!("{}", sep);
    println!("{}", build_row(&head, &widths));
    println!("{}", sep);
    for row in &clipped {
        println!("{}", build_row(row, &widths));
    }
    println!("{}", sep);
    clipped.len()
}

pub fn course_rows(courses: &[Course]) -> Vec<Vec<String>> {
    courses
        .iter()
        .map(|c| {
            vec![
                c.id.to_string(),
                c.title.clone(),
                c.instructor.clone().unwrap_or_else(|| "-".to_string()),
                c.credits.to_string(),
                format!("{}/{}", c.enrolled_count, c.capacity),
                c.description.clone().unwrap_or_else(|| "No description available".to_string()),
            ]
        })
        .collect()
}

pub const COURSE_HEADERS: [&str; 6] = ["id", "title", "instructor", "credits", "seats", "description"];

pub fn enrollment_rows(enrollments: &[Enrollment]) -> Vec<Vec<String>> {
    enrollments
        .iter()
        .map(|e| {
            let (title, credits) = match &e.course {
                Some(c) => (c.title.clone(), c.credits.to_string()),
                None => ("(course removed)".to_string(), "-".to_string()),
            };
            let status = match e.status {
                EnrollmentStatus::Enrolled => "enrolled",
                EnrollmentStatus::Pending => "pending",
            };
            vec![e.id.to_string(), title, credits, status.to_string()]
        })
        .collect()
}

pub const ENROLLMENT_HEADERS: [&str; 4] = ["id", "course", "credits", "status"];

pub fn user_rows(users: &[Identity]) -> Vec<Vec<String>> {
    users
        .iter()
        .map(|u| {
            vec![u.id.to_string(), u.username.clone(), u.email.clone(), u.role.to_string()]
        })
        .collect()
}

pub const USER_HEADERS: [&str; 4] = ["id", "username", "email", "role"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_keeps_short_strings() {
        assert_eq!(clip("Databases", 20), "Databases");
    }

    #[test]
    fn clip_elides_long_strings() {
        let out = clip("A very long course description that will not fit", 12);
        assert_eq!(out.chars().count(), 12);
        assert!(out.ends_with('…'));
    }

    #[test]
    fn row_padding_matches_widths() {
        let widths = vec![4, 6];
        let row = build_row(&["ab".to_string(), "cdef".to_string()], &widths);
        assert_eq!(row, "| ab   | cdef   |");
        assert_eq!(build_separator(&widths), "+------+--------+");
    }
}
