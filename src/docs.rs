use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::handlers::{attempt, auth, contribution, events};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Mock Exam API",
        version = "0.1.0",
        description = "Shared mock exam events: hosts create and publish, teachers contribute questions, students attempt."
    ),
    paths(
        auth::register,
        auth::login,
        events::create_event,
        events::list_events,
        events::get_event,
        events::publish_event,
        events::delete_event,
        events::event_results,
        contribution::list_teacher_events,
        contribution::get_teacher_event,
        contribution::contribute,
        attempt::list_published_events,
        attempt::get_paper,
        attempt::submit_attempt,
    ),
    tags(
        (name = "Auth", description = "Registration and login"),
        (name = "Host", description = "Event administration and results"),
        (name = "Teacher", description = "Question contributions"),
        (name = "Student", description = "Taking published exams"),
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
