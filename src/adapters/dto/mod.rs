pub mod token_dto;
pub mod upload_dto;
