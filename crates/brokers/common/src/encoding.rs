use tradelink_core::Params;

/// `application/x-www-form-urlencoded` encoding of request parameters.
pub fn urlencode(params: &Params) -> String {
    // Encoding a map of strings cannot fail.
    serde_urlencoded::to_string(params).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urlencode_sorted_and_escaped() {
        let mut params = Params::new();
        params.insert("currencyPair".to_string(), "BTC_EUR".to_string());
        params.insert("amount".to_string(), "0.5".to_string());
        params.insert("note".to_string(), "a b&c".to_string());

        assert_eq!(
            urlencode(&params),
            "amount=0.5&currencyPair=BTC_EUR&note=a+b%26c"
        );
    }

    #[test]
    fn test_urlencode_empty() {
        assert_eq!(urlencode(&Params::new()), "");
    }
}
