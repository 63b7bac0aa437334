pub mod payment_dto;
pub mod quiz_dto;
