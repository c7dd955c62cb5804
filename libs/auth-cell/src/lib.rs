pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use router::auth_routes;
pub use services::login::LoginService;
pub use services::password::PasswordService;
