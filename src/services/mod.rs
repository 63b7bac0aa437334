pub mod notchpay_service;
pub mod payment_gateway;
pub mod payment_service;
pub mod quiz_service;
pub mod scoring_service;
