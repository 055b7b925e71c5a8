use serenity::builder::{CreateEmbed, CreateEmbedFooter};
use serenity::model::Timestamp;
use swingscan_core::domain::stock::AiStock;

const COLOR_UP: u32 = 0x22c55e;
const COLOR_DOWN: u32 = 0xef4444;

fn footer() -> CreateEmbedFooter {
    CreateEmbedFooter::new("AI Stock Screener Bot")
}

pub fn card_title(stock: &AiStock) -> String {
    format!("\u{1F4C8} {} ({})", stock.company_name, stock.ticker)
}

pub fn quote_url(ticker: &str) -> String {
    format!("https://finance.yahoo.com/quote/{ticker}")
}

pub fn card_color(stock: &AiStock) -> u32 {
    if stock.is_up() {
        COLOR_UP
    } else {
        COLOR_DOWN
    }
}

/// `(name, value)` pairs, all rendered inline.
pub fn card_fields(stock: &AiStock) -> Vec<(&'static str, String)> {
    vec![
        ("Match Score", format!("**{}%**", stock.match_score)),
        ("Current Price", format!("**${:.2}**", stock.current_price)),
        ("Day Change", stock.day_change_label()),
        ("Avg Volume", stock.average_volume.clone()),
        ("RSI (14)", format!("{:.1}", stock.rsi)),
        ("MACD Status", stock.macd_status.to_string()),
    ]
}

pub fn stock_embed(stock: &AiStock) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title(card_title(stock))
        .url(quote_url(&stock.ticker))
        .description(stock.rationale.clone())
        .color(card_color(stock))
        .footer(footer())
        .timestamp(Timestamp::now());

    for (name, value) in card_fields(stock) {
        embed = embed.field(name, value, true);
    }
    embed
}

#[cfg(test)]
mod tests {
    use super::*;
    use swingscan_core::domain::stock::MacdStatus;

    fn stock(price_change: f64, price_change_percent: f64) -> AiStock {
        AiStock {
            ticker: "AAPL".to_string(),
            company_name: "Apple Inc.".to_string(),
            current_price: 190.0,
            price_change,
            price_change_percent,
            average_volume: "52.3M".to_string(),
            rsi: 58.24,
            macd_status: MacdStatus::NotAvailable,
            match_score: 82,
            rationale: "Above both MAs.".to_string(),
            sparkline_data: vec![190.0; 24],
        }
    }

    #[test]
    fn test_title_and_url() {
        let s = stock(1.5, 0.79);
        assert_eq!(card_title(&s), "📈 Apple Inc. (AAPL)");
        assert_eq!(quote_url(&s.ticker), "https://finance.yahoo.com/quote/AAPL");
    }

    #[test]
    fn test_fields_formatting() {
        let fields = card_fields(&stock(1.5, 0.79));
        let values: Vec<(&str, &str)> = fields.iter().map(|(n, v)| (*n, v.as_str())).collect();
        assert_eq!(
            values,
            vec![
                ("Match Score", "**82%**"),
                ("Current Price", "**$190.00**"),
                ("Day Change", "+1.50 (+0.79%)"),
                ("Avg Volume", "52.3M"),
                ("RSI (14)", "58.2"),
                ("MACD Status", "N/A"),
            ]
        );
    }

    #[test]
    fn test_color_follows_day_change() {
        assert_eq!(card_color(&stock(0.0, 0.0)), COLOR_UP);
        assert_eq!(card_color(&stock(-0.01, -0.01)), COLOR_DOWN);
        assert_eq!(card_fields(&stock(-2.0, -1.05))[2].1, "-2.00 (-1.05%)");
    }
}
