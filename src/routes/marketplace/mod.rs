mod handler;

pub use handler::{AccessTokenResponse, ListOrdersQuery, access_token, list_orders};
