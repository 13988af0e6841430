#![allow(missing_docs)]

pub(crate) mod fixtures;
pub(crate) mod http;

pub(crate) use fixtures::{
    cash_input, create_test_user, get_test_connection, new_expense, upi_input,
};
pub(crate) use http::{assert_json_error, get_test_server, token_for};
