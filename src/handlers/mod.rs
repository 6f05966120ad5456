pub mod session_handler;

use actix_web::web;

pub use session_handler::{
    create_session, generate_quiz, get_quiz, get_session, health_check, select_source,
    submit_topic, upload_file,
};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check)
        .service(create_session)
        .service(get_session)
        .service(select_source)
        .service(upload_file)
        .service(submit_topic)
        .service(generate_quiz)
        .service(get_quiz);
}
