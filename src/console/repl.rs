use std::io::{self, Write};

use anyhow::Result;
use tokio::runtime::Runtime;

use crate::enrollment::{Confirm, CourseBoard, EnrollOutcome, EnrollmentBoard, UnenrollOutcome};
use crate::gateway::{HttpGateway, PictureSource};
use crate::guard::{decide, AccessDecision, PageRequirement};
use crate::models::{CourseUpdate, EnrollmentStatus, NewCourse, ProfileUpdate, Role};
use crate::session::SessionStore;

use super::{
    course_rows, enrollment_rows, print_table, user_rows, COURSE_HEADERS, ENROLLMENT_HEADERS,
    USER_HEADERS,
};

fn print_help() {
    println!(
        "Commands:\n  register <username> <email> <password> [role]   create an account (role defaults to student)\n  login <username> <password>                     sign in\n  logout                                          sign out (local state clears even if the server is down)\n  status                                          show the current session\n  refresh                                         re-sync the session with the server\n  courses                                         browse the course catalog\n  enroll <course_id>                              enroll in a course\n  dashboard                                       your enrollments and progress\n  unenroll <enrollment_id>                        leave a course (asks for confirmation)\n  profile [user_id]                               view a profile (own by default)\n  profile set <field> <value...>                  update own profile (full_name, phone, bio, address, city, state, country)\n  picture <url>                                   set own profile picture by URL\n  users                                           list all users (admin)\n  course show <id>                                course details\n  course add <title...>                           create a course (teacher/admin)\n  course set <id> <field> <value...>              update a course (title, description, credits, capacity)\n  course drop <id>                                delete a course\n  help                                            this text\n  quit | exit                                     leave"
    );
}

/// Interactive front-end over the session store, guard, and boards. Each
/// command that corresponds to a routed page consults the Access Guard before
/// rendering anything.
pub struct Console {
    store: SessionStore<HttpGateway>,
    courses: CourseBoard<HttpGateway>,
    dashboard: EnrollmentBoard<HttpGateway>,
}

impl Console {
    pub fn new(gateway: HttpGateway) -> Self {
        // Boards share the gateway's cookie session with the store
        Self {
            store: SessionStore::new(gateway.clone()),
            courses: CourseBoard::new(gateway.clone()),
            dashboard: EnrollmentBoard::new(gateway),
        }
    }

    /// Visit a routed page: re-check the session (an expired cookie must act
    /// as an implicit logout, not an error banner), then ask the guard.
    fn gate(&self, rt: &Runtime, requirement: PageRequirement) -> bool {
        if self.store.is_authenticated() {
            if let Err(err) = rt.block_on(self.store.refresh()) {
                // Transport failure: keep the last-known session and let the
                // page's own fetch surface any problem.
                tracing::debug!(error = %err, "session re-check failed");
            }
        }
        match decide(&self.store.snapshot(), requirement) {
            AccessDecision::Render => true,
            AccessDecision::RenderLoading => {
                println!("Loading...");
                false
            }
            AccessDecision::RedirectTo(path) => {
                println!("redirecting to {}: please log in first", path);
                false
            }
            AccessDecision::RenderForbidden => {
                println!("forbidden: your role does not allow this page");
                false
            }
        }
    }

    fn show_status(&self) {
        let snap = self.store.snapshot();
        match &snap.identity {
            Some(id) => println!("logged in as {} <{}> role={}", id.username, id.email, id.role),
            None => println!("not logged in"),
        }
        if let Some(err) = &snap.last_error {
            println!("last error: {}", err.message());
        }
    }

    fn page_courses(&self, rt: &Runtime) {
        if !self.gate(rt, PageRequirement::RequiresAuth) {
            return;
        }
        self.dashboard.detach();
        rt.block_on(self.courses.load());
        if let Some(err) = self.courses.page_error() {
            println!("error: {}", err.message());
        }
        let rows = course_rows(&self.courses.courses());
        if rows.is_empty() {
            println!("no courses available");
        } else {
            print_table(&COURSE_HEADERS, &rows);
        }
    }

    fn page_dashboard(&self, rt: &Runtime) {
        if !self.gate(rt, PageRequirement::RequiresAuth) {
            return;
        }
        self.courses.detach();
        rt.block_on(self.dashboard.load());
        if let Some(err) = self.dashboard.page_error() {
            println!("error: {}", err.message());
        }
        if let Some(id) = self.store.identity() {
            println!("Welcome, {}!", id.username);
        }
        println!(
            "enrolled: {}, pending: {}",
            self.dashboard.count_with_status(EnrollmentStatus::Enrolled),
            self.dashboard.count_with_status(EnrollmentStatus::Pending)
        );
        let rows = enrollment_rows(&self.dashboard.enrollments());
        if rows.is_empty() {
            println!("no enrollments yet; try 'courses'");
        } else {
            print_table(&ENROLLMENT_HEADERS, &rows);
        }
    }

    fn do_enroll(&self, rt: &Runtime, course_id: i64) {
        if !self.gate(rt, PageRequirement::RequiresAuth) {
            return;
        }
        match rt.block_on(self.courses.enroll(course_id)) {
            EnrollOutcome::Enrolled(_) => {
                println!("Enrolled successfully! See 'dashboard' for your courses.")
            }
            EnrollOutcome::AlreadyPending => {
                println!("an enrollment request for this course is already in flight")
            }
            EnrollOutcome::Superseded => {}
            EnrollOutcome::Failed(err) => println!("error: {}", err.message()),
        }
    }

    fn do_unenroll(&self, rt: &Runtime, enrollment_id: i64) {
        if !self.gate(rt, PageRequirement::RequiresAuth) {
            return;
        }
        print!("Are you sure you want to unenroll from this course? [y/N] ");
        let _ = io::stdout().flush();
        let mut answer = String::new();
        if io::stdin().read_line(&mut answer).is_err() {
            return;
        }
        let confirm = if answer.trim().eq_ignore_ascii_case("y") { Confirm::Yes } else { Confirm::No };
        match rt.block_on(self.dashboard.unenroll(enrollment_id, confirm)) {
            UnenrollOutcome::Removed => println!("Unenrolled successfully"),
            UnenrollOutcome::Declined => println!("not unenrolled"),
            UnenrollOutcome::AlreadyPending => println!("that request is already in flight"),
            UnenrollOutcome::Superseded => {}
            UnenrollOutcome::Failed(err) => println!("error: {}", err.message()),
        }
    }

    fn page_profile(&self, rt: &Runtime, user_id: Option<i64>) {
        if !self.gate(rt, PageRequirement::RequiresAuth) {
            return;
        }
        let Some(own) = self.store.identity() else { return };
        let target = user_id.unwrap_or(own.id);
        match rt.block_on(self.store.gateway().fetch_profile(target)) {
            Ok(id) => {
                println!("{} <{}> role={}", id.username, id.email, id.role);
                let p = &id.profile;
                for (label, value) in [
                    ("full_name", &p.full_name),
                    ("phone", &p.phone),
                    ("bio", &p.bio),
                    ("address", &p.address),
                    ("city", &p.city),
                    ("state", &p.state),
                    ("country", &p.country),
                ] {
                    if let Some(v) = value {
                        println!("  {}: {}", label, v);
                    }
                }
            }
            Err(err) => println!("error: {}", err.message()),
        }
    }

    fn do_profile_set(&self, rt: &Runtime, field: &str, value: String) {
        if !self.gate(rt, PageRequirement::RequiresAuth) {
            return;
        }
        let Some(own) = self.store.identity() else { return };
        let mut upd = ProfileUpdate::default();
        match field {
            "full_name" => upd.full_name = Some(value),
            "phone" => upd.phone = Some(value),
            "bio" => upd.bio = Some(value),
            "address" => upd.address = Some(value),
            "city" => upd.city = Some(value),
            "state" => upd.state = Some(value),
            "country" => upd.country = Some(value),
            other => {
                println!("unknown profile field: {}", other);
                return;
            }
        }
        match rt.block_on(self.store.gateway().update_profile(own.id, &upd)) {
            Ok(_) => {
                println!("Profile updated");
                // Reconcile the session identity with the server copy
                let _ = rt.block_on(self.store.refresh());
            }
            Err(err) => println!("error: {}", err.message()),
        }
    }

    fn do_picture(&self, rt: &Runtime, url: String) {
        if !self.gate(rt, PageRequirement::RequiresAuth) {
            return;
        }
        let Some(own) = self.store.identity() else { return };
        match rt.block_on(self.store.gateway().upload_picture(own.id, &PictureSource::Url(url))) {
            Ok(picture_url) => println!("picture set: {}", picture_url),
            Err(err) => println!("error: {}", err.message()),
        }
    }

    fn page_users(&self, rt: &Runtime) {
        if !self.gate(rt, PageRequirement::RequiresRole(Role::Admin)) {
            return;
        }
        match rt.block_on(self.store.gateway().list_users()) {
            Ok(users) => {
                print_table(&USER_HEADERS, &user_rows(&users));
            }
            Err(err) => println!("error: {}", err.message()),
        }
    }

    fn do_course_command(&self, rt: &Runtime, parts: &[&str]) {
        if !self.gate(rt, PageRequirement::RequiresAuth) {
            return;
        }
        match parts {
            ["add", title @ ..] if !title.is_empty() => {
                let req = NewCourse {
                    title: title.join(" "),
                    description: None,
                    credits: None,
                    capacity: None,
                    instructor_id: None,
                };
                match rt.block_on(self.store.gateway().create_course(&req)) {
                    Ok(c) => println!("course created: id={} {}", c.id, c.title),
                    Err(err) => println!("error: {}", err.message()),
                }
            }
            ["set", id, field, value @ ..] if !value.is_empty() => {
                let Ok(course_id) = id.parse::<i64>() else {
                    println!("course set: bad id '{}'", id);
                    return;
                };
                let joined = value.join(" ");
                let mut upd = CourseUpdate::default();
                match *field {
                    "title" => upd.title = Some(joined),
                    "description" => upd.description = Some(joined),
                    "credits" => match joined.parse() {
                        Ok(n) => upd.credits = Some(n),
                        Err(_) => {
                            println!("credits must be a number");
                            return;
                        }
                    },
                    "capacity" => match joined.parse() {
                        Ok(n) => upd.capacity = Some(n),
                        Err(_) => {
                            println!("capacity must be a number");
                            return;
                        }
                    },
                    other => {
                        println!("unknown course field: {}", other);
                        return;
                    }
                }
                match rt.block_on(self.store.gateway().update_course(course_id, &upd)) {
                    Ok(c) => println!("course updated: id={} {}", c.id, c.title),
                    Err(err) => println!("error: {}", err.message()),
                }
            }
            ["show", id] => {
                let Ok(course_id) = id.parse::<i64>() else {
                    println!("course show: bad id '{}'", id);
                    return;
                };
                match rt.block_on(self.store.gateway().get_course(course_id)) {
                    Ok(c) => {
                        println!("{} (id={})", c.title, c.id);
                        if let Some(desc) = &c.description {
                            println!("  {}", desc);
                        }
                        if let Some(instructor) = &c.instructor {
                            println!("  instructor: {}", instructor);
                        }
                        println!(
                            "  credits: {}, seats: {}/{}",
                            c.credits, c.enrolled_count, c.capacity
                        );
                    }
                    Err(err) => println!("error: {}", err.message()),
                }
            }
            ["drop", id] => {
                let Ok(course_id) = id.parse::<i64>() else {
                    println!("course drop: bad id '{}'", id);
                    return;
                };
                match rt.block_on(self.store.gateway().delete_course(course_id)) {
                    Ok(()) => println!("course deleted"),
                    Err(err) => println!("error: {}", err.message()),
                }
            }
            _ => println!(
                "usage: course show <id> | course add <title...> | course set <id> <field> <value...> | course drop <id>"
            ),
        }
    }

    pub fn run(&self, rt: &Runtime) -> Result<()> {
        // The startup session check must resolve before any page decision
        rt.block_on(self.store.initialize());
        self.show_status();

        let stdin = io::stdin();
        let mut stdout = io::stdout();
        let mut input = String::new();
        println!("coursedesk console. Type 'help' for commands.");
        loop {
            input.clear();
            print!("> ");
            let _ = stdout.flush();
            if stdin.read_line(&mut input).is_err() {
                break;
            }
            if input.is_empty() {
                // EOF
                break;
            }
            let line = input.trim();
            if line.is_empty() {
                continue;
            }
            let parts: Vec<&str> = line.split_whitespace().collect();
            match parts.as_slice() {
                ["quit"] | ["exit"] => break,
                ["help"] => print_help(),
                ["status"] | ["whoami"] => self.show_status(),
                ["register", username, email, password, rest @ ..] => {
                    let role = match rest {
                        [] => Role::Student,
                        [r] => match Role::parse(r) {
                            Some(role) => role,
                            None => {
                                println!("unknown role '{}'; use student, teacher or admin", r);
                                continue;
                            }
                        },
                        _ => {
                            println!("usage: register <username> <email> <password> [role]");
                            continue;
                        }
                    };
                    match rt.block_on(self.store.register(username, email, password, role)) {
                        Ok(id) => println!("registered and logged in as {}", id.username),
                        Err(err) => println!("error: {}", err.message()),
                    }
                }
                ["login", username, password] => {
                    match rt.block_on(self.store.login(username, password)) {
                        Ok(id) => println!("welcome back, {}", id.username),
                        Err(err) => println!("error: {}", err.message()),
                    }
                }
                ["logout"] => {
                    rt.block_on(self.store.logout());
                    println!("logged out");
                }
                ["refresh"] => match rt.block_on(self.store.refresh()) {
                    Ok(Some(id)) => println!("session ok: {}", id.username),
                    Ok(None) => println!("session expired; please log in again"),
                    Err(err) => println!("error: {}", err.message()),
                },
                ["courses"] => self.page_courses(rt),
                ["dashboard"] => self.page_dashboard(rt),
                ["enroll", id] => match id.parse::<i64>() {
                    Ok(course_id) => self.do_enroll(rt, course_id),
                    Err(_) => println!("enroll: bad course id '{}'", id),
                },
                ["unenroll", id] => match id.parse::<i64>() {
                    Ok(enrollment_id) => self.do_unenroll(rt, enrollment_id),
                    Err(_) => println!("unenroll: bad enrollment id '{}'", id),
                },
                ["profile"] => self.page_profile(rt, None),
                ["profile", "set", field, value @ ..] if !value.is_empty() => {
                    self.do_profile_set(rt, field, value.join(" "));
                }
                ["profile", id] => match id.parse::<i64>() {
                    Ok(user_id) => self.page_profile(rt, Some(user_id)),
                    Err(_) => println!("profile: bad user id '{}'", id),
                },
                ["picture", url] => self.do_picture(rt, url.to_string()),
                ["users"] => self.page_users(rt),
                ["course", rest @ ..] => self.do_course_command(rt, rest),
                _ => println!("unrecognized command; type 'help'"),
            }
        }
        Ok(())
    }
}
