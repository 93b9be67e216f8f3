use anyhow::{anyhow, Result};

// errors if input contains non-alphanumeric characters or underscore
// in other words, valid identifiers only
pub fn check_input(input: &str) -> Result<()> {
    let valid = !input.is_empty()
        && input
            .as_bytes()
            .iter()
            .all(|&c| c.is_ascii_alphanumeric() || c == b'_');
    match valid {
        true => Ok(()),
        false => Err(anyhow!("Invalid Input: {}", input)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_input() {
        assert!(check_input("faq").is_ok());
        assert!(check_input("orders_2024").is_ok());
        assert!(check_input("").is_err());
        assert!(check_input("faq; drop table orders").is_err());
        assert!(check_input("public.orders").is_err());
    }
}
