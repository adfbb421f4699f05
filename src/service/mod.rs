pub mod finance_service;
