mod resolver_tests;
mod utils;
