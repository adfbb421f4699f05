pub mod finance_routes;
