pub mod base_service_repo;
pub mod census_repo;
pub mod session_repo;
pub mod token_service_repo;
