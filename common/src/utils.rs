// common/src/utils.rs
use chrono::DateTime;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;
/// One unit of the fourth decimal place, in wei
const WEI_PER_DISPLAY_UNIT: u128 = 100_000_000_000_000;

/// Setup tracing for the client. `RUST_LOG` overrides the configured level.
pub fn setup_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

/// Shorten an address for display: `0x71C7...976F`
pub fn format_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// `0x` followed by 40 hex digits. Mixed-case checksums are not verified.
pub fn is_valid_address(address: &str) -> bool {
    address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .map_or(false, |hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Exact decimal rendering of a wei amount in ether, without trailing zeros
pub fn format_ether(wei: u128) -> String {
    let whole = wei / WEI_PER_ETHER;
    let fraction = wei % WEI_PER_ETHER;
    let digits = format!("{:018}", fraction);
    let trimmed = digits.trim_end_matches('0');
    if trimmed.is_empty() {
        format!("{}.0", whole)
    } else {
        format!("{}.{}", whole, trimmed)
    }
}

/// Wallet balance as shown in the session: four decimals, rounded half up,
/// followed by the currency unit
pub fn format_balance(wei: u128, symbol: &str) -> String {
    let units = wei / WEI_PER_DISPLAY_UNIT
        + u128::from(wei % WEI_PER_DISPLAY_UNIT >= WEI_PER_DISPLAY_UNIT / 2);
    format!("{}.{:04} {}", units / 10_000, units % 10_000, symbol)
}

/// Compact large amounts: `1.50M`, `2.50K`
pub fn format_large_number(num: f64) -> String {
    if num >= 1_000_000.0 {
        format!("{:.2}M", num / 1_000_000.0)
    } else if num >= 1_000.0 {
        format!("{:.2}K", num / 1_000.0)
    } else {
        num.to_string()
    }
}

/// Unix seconds rendered like `Jan 5, 2024, 03:04 PM` (UTC)
pub fn format_timestamp(timestamp: i64) -> Option<String> {
    DateTime::from_timestamp(timestamp, 0)
        .map(|date| date.format("%b %-d, %Y, %I:%M %p").to_string())
}
