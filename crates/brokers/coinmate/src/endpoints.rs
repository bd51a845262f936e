use std::str::FromStr;
use tradelink_core::{ApiScope, HttpMethod};

// ---------------------------------------------------------------------------
// Public (GET, unauthenticated)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PublicEndpoint {
    OrderBook,
    Ticker,
    Transactions,
}

impl PublicEndpoint {
    pub const ALL: [PublicEndpoint; 3] = [
        PublicEndpoint::OrderBook,
        PublicEndpoint::Ticker,
        PublicEndpoint::Transactions,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            PublicEndpoint::OrderBook => "orderBook",
            PublicEndpoint::Ticker => "ticker",
            PublicEndpoint::Transactions => "transactions",
        }
    }

    pub fn scope(&self) -> ApiScope {
        ApiScope::Public
    }

    pub fn method(&self) -> HttpMethod {
        HttpMethod::Get
    }
}

// ---------------------------------------------------------------------------
// Private (POST, signed, form-encoded)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrivateEndpoint {
    Balances,
    BitcoinWithdrawal,
    BitcoinDepositAddresses,
    BuyInstant,
    BuyLimit,
    CancelOrder,
    CancelOrderWithInfo,
    CreateVoucher,
    OpenOrders,
    RedeemVoucher,
    SellInstant,
    SellLimit,
    TransactionHistory,
    UnconfirmedBitcoinDeposits,
}

impl PrivateEndpoint {
    pub const ALL: [PrivateEndpoint; 14] = [
        PrivateEndpoint::Balances,
        PrivateEndpoint::BitcoinWithdrawal,
        PrivateEndpoint::BitcoinDepositAddresses,
        PrivateEndpoint::BuyInstant,
        PrivateEndpoint::BuyLimit,
        PrivateEndpoint::CancelOrder,
        PrivateEndpoint::CancelOrderWithInfo,
        PrivateEndpoint::CreateVoucher,
        PrivateEndpoint::OpenOrders,
        PrivateEndpoint::RedeemVoucher,
        PrivateEndpoint::SellInstant,
        PrivateEndpoint::SellLimit,
        PrivateEndpoint::TransactionHistory,
        PrivateEndpoint::UnconfirmedBitcoinDeposits,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            PrivateEndpoint::Balances => "balances",
            PrivateEndpoint::BitcoinWithdrawal => "bitcoinWithdrawal",
            PrivateEndpoint::BitcoinDepositAddresses => "bitcoinDepositAddresses",
            PrivateEndpoint::BuyInstant => "buyInstant",
            PrivateEndpoint::BuyLimit => "buyLimit",
            PrivateEndpoint::CancelOrder => "cancelOrder",
            PrivateEndpoint::CancelOrderWithInfo => "cancelOrderWithInfo",
            PrivateEndpoint::CreateVoucher => "createVoucher",
            PrivateEndpoint::OpenOrders => "openOrders",
            PrivateEndpoint::RedeemVoucher => "redeemVoucher",
            PrivateEndpoint::SellInstant => "sellInstant",
            PrivateEndpoint::SellLimit => "sellLimit",
            PrivateEndpoint::TransactionHistory => "transactionHistory",
            PrivateEndpoint::UnconfirmedBitcoinDeposits => "unconfirmedBitcoinDeposits",
        }
    }

    pub fn scope(&self) -> ApiScope {
        ApiScope::Private
    }

    pub fn method(&self) -> HttpMethod {
        HttpMethod::Post
    }
}

impl FromStr for PrivateEndpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PrivateEndpoint::ALL
            .iter()
            .copied()
            .find(|e| e.path() == s)
            .ok_or_else(|| format!("unknown private endpoint: {}", s))
    }
}

impl FromStr for PublicEndpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PublicEndpoint::ALL
            .iter()
            .copied()
            .find(|e| e.path() == s)
            .ok_or_else(|| format!("unknown public endpoint: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_parse_back() {
        for endpoint in PrivateEndpoint::ALL {
            assert_eq!(endpoint.path().parse::<PrivateEndpoint>().unwrap(), endpoint);
            assert_eq!(endpoint.method(), HttpMethod::Post);
        }
        for endpoint in PublicEndpoint::ALL {
            assert_eq!(endpoint.path().parse::<PublicEndpoint>().unwrap(), endpoint);
            assert_eq!(endpoint.method(), HttpMethod::Get);
        }
    }

    #[test]
    fn test_unknown_path() {
        assert!("withdrawAll".parse::<PrivateEndpoint>().is_err());
    }
}
