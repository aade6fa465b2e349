//! Prompt text for each advisory operation. All prompts speak in KES and
//! Kenyan market terms; the pricing prompt demands JSON-only output so the
//! parser has a fighting chance.

use rust_decimal::Decimal;

use agrilink_core::domain::negotiation::BuyerProfile;
use agrilink_core::domain::product::Product;
use agrilink_core::pricing::context::MarketContext;
use agrilink_core::pricing::season::Season;

pub const PRICING_SYSTEM: &str = "You are an agricultural market expert specializing in price \
     optimization for fresh produce in Kenya. Analyze market data and provide intelligent price \
     recommendations considering quality, location, seasonality, and demand.";

pub const NEGOTIATION_SYSTEM: &str = "You are an expert agricultural negotiator helping farmers \
     get fair prices while maintaining good buyer relationships.";

pub const INSIGHTS_SYSTEM: &str = "You are an agricultural market analyst providing insights for \
     Kenyan farmers and buyers.";

pub const RECOMMENDATIONS_SYSTEM: &str = "You are a personalized agricultural shopping assistant \
     for Kenyan farmers and buyers.";

pub fn pricing_user(product: &Product, context: &MarketContext, season: Season) -> String {
    format!(
        "Analyze this agricultural product and provide price optimization advice:\n\n\
         PRODUCT DETAILS:\n\
         - Name: {name}\n\
         - Category: {category}\n\
         - Current Price: KES {price}\n\
         - Quality Grade: {grade}\n\
         - Location: {location}\n\
         - Harvest Date: {harvest}\n\
         - Quantity: {quantity} {unit}\n\n\
         MARKET CONTEXT:\n\
         - Average Market Price: KES {average}\n\
         - Price Trend: {trend}\n\
         - Demand Level: {demand}\n\
         - Season: {season}\n\n\
         Please provide:\n\
         1. Recommended optimal price (KES)\n\
         2. Price confidence score (0-1)\n\
         3. Price label (best_price, good_price, fair_price, high_price)\n\
         4. Key factors influencing this recommendation\n\
         5. Brief explanation\n\n\
         Respond with JSON only, using keys: suggested_price, confidence_score, price_label, \
         factors, explanation",
        name = product.name,
        category = product.category_name,
        price = product.base_price,
        grade = product.grade_label(),
        location = product.location.as_deref().unwrap_or("unknown"),
        harvest = product.harvest_date.format("%Y-%m-%d"),
        quantity = product.quantity,
        unit = product.unit,
        average = context.average_price,
        trend = context.price_trend.as_str(),
        demand = context.demand_level.as_str(),
        season = season.label,
    )
}

pub fn negotiation_user(product: &Product, buyer: &BuyerProfile, offer: Decimal) -> String {
    format!(
        "Product: {name}\n\
         Category: {category}\n\
         Current Price: KES {price}\n\
         Quality: {grade}\n\
         Location: {location}\n\n\
         Buyer Offer: KES {offer}\n\
         Buyer Type: {buyer_type}\n\
         Buyer Location: {buyer_location}\n\n\
         As an agricultural negotiation expert, provide:\n\
         1. Recommended counter-offer price\n\
         2. Negotiation strategy points\n\
         3. Key value propositions to emphasize\n\
         4. Potential compromise points\n\n\
         Respond with JSON only, using keys: counter_offer, strategy_points, value_propositions, \
         compromise_points",
        name = product.name,
        category = product.category_name,
        price = product.base_price,
        grade = product.grade_label(),
        location = product.location.as_deref().unwrap_or("unknown"),
        buyer_type = buyer.buyer_type,
        buyer_location = buyer.location.as_deref().unwrap_or("unknown"),
    )
}

pub fn insights_user(market_data: &str) -> String {
    format!(
        "Current Market Data:\n{market_data}\n\n\
         Provide:\n\
         1. Current market analysis\n\
         2. Price trend predictions for the next week\n\
         3. Buying/selling recommendations\n\
         4. Key factors affecting prices\n\n\
         Respond in a structured format suitable for farmers and buyers."
    )
}

pub fn recommendations_user(
    buyer: &BuyerProfile,
    recent_searches: &[String],
    wishlist_items: &[String],
) -> String {
    format!(
        "User Profile:\n\
         - Type: {buyer_type}\n\
         - Location: {location}\n\
         - Recent searches: {searches}\n\
         - Wishlist items: {wishlist}\n\n\
         Based on this user's profile and behavior, recommend:\n\
         1. Products they might be interested in\n\
         2. Optimal buying/selling timing\n\
         3. Price alerts to set\n\
         4. Market opportunities\n\n\
         Provide specific, actionable recommendations.",
        buyer_type = buyer.buyer_type,
        location = buyer.location.as_deref().unwrap_or("Nairobi"),
        searches = recent_searches.join(", "),
        wishlist = wishlist_items.join(", "),
    )
}
