pub mod error;
pub mod repositories;
pub mod services;

#[cfg(test)]
pub mod test_support;
