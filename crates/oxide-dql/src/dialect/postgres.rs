use super::Dialect;

/// PostgreSQL: supports `RETURNING` and standard `TRUE`/`FALSE` literals.
#[derive(Debug, Default, Clone, Copy)]
pub struct Postgres;

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supports_returning() {
        assert!(Postgres.supports_returning());
    }
}
