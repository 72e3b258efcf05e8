//! Query plans behind the listing endpoints.
//!
//! Each endpoint loads exactly the relations its response needs. Anything
//! else stays `NotLoaded`, so a plan that forgets a relation fails assembly
//! instead of triggering a lazy query.

use uuid::Uuid;

use rates_types::{
    Country, Currency, Document, Entity, Join, Load, Predicate, ProviderExchangeRate, Select,
    TransferProvider, TransferRule,
};

/// Active providers with their active rules, loaded select-in style.
///
/// Rules carry their countries and transfer currency.
pub fn providers_with_rules() -> Select<TransferProvider> {
    TransferProvider::active().order_by("name").load(
        Load::active(TransferProvider::TRANSFER_RULES)
            .load(Load::new(TransferRule::SEND_COUNTRY))
            .load(Load::new(TransferRule::RECEIVE_COUNTRY))
            .load(Load::new(TransferRule::TRANSFER_CURRENCY)),
    )
}

/// Active rules with everything the detailed view shows.
///
/// Single-valued relations are joined. Countries bring their local currency
/// along; required documents are joined too and deduplicated by the loader.
pub fn detailed_rules() -> Select<TransferRule> {
    TransferRule::active()
        .join(Join::new(TransferRule::PROVIDER))
        .join(Join::new(TransferRule::SEND_COUNTRY).then(Join::new(Country::LOCAL_CURRENCY)))
        .join(Join::new(TransferRule::RECEIVE_COUNTRY).then(Join::new(Country::LOCAL_CURRENCY)))
        .join(Join::new(TransferRule::TRANSFER_CURRENCY))
        .join(Join::active(TransferRule::REQUIRED_DOCUMENTS))
}

/// Active rates joined with provider and both currencies.
pub fn exchange_rates() -> Select<ProviderExchangeRate> {
    ProviderExchangeRate::active()
        .join(Join::new(ProviderExchangeRate::PROVIDER))
        .join(Join::new(ProviderExchangeRate::FROM_CURRENCY))
        .join(Join::new(ProviderExchangeRate::TO_CURRENCY))
}

/// One active rate, provided its provider is active too.
pub fn exchange_rate(id: Uuid) -> Select<ProviderExchangeRate> {
    exchange_rates()
        .by_id(id)
        .filter(Predicate::has_active(ProviderExchangeRate::PROVIDER))
}

/// Active currencies, optionally narrowed to one abbreviation.
pub fn currencies(abbreviation: Option<&str>) -> Select<Currency> {
    let select = Currency::active().order_by("abbreviation");
    match abbreviation {
        Some(code) => select.filter(Predicate::eq("abbreviation", code.to_uppercase())),
        None => select,
    }
}

/// Active countries with their local currency joined.
pub fn countries() -> Select<Country> {
    Country::active()
        .order_by("name")
        .join(Join::new(Country::LOCAL_CURRENCY))
}

pub fn documents() -> Select<Document> {
    Document::active().order_by("name")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_listing_loads_only_active_rules() {
        let select = providers_with_rules();
        assert!(select.joins().is_empty());
        assert_eq!(select.loads().len(), 1);

        let rules = &select.loads()[0];
        assert!(rules.active_only);
        assert_eq!(rules.loads.len(), 3);
    }

    fn requires_active_provider<E: Entity>(select: &Select<E>) -> bool {
        select
            .predicates()
            .iter()
            .any(|p| matches!(p, Predicate::HasActive(r) if r.name == "provider"))
    }

    #[test]
    fn test_listings_filter_only_on_own_active_flag() {
        let rules = detailed_rules();
        assert_eq!(rules.predicates().len(), 1);
        assert_eq!(rules.joins().len(), 5);

        let rates = exchange_rates();
        assert_eq!(rates.predicates().len(), 1);
        assert!(!requires_active_provider(&rates));
    }

    #[test]
    fn test_rate_by_id_requires_active_provider() {
        assert!(requires_active_provider(&exchange_rate(Uuid::new_v4())));
    }

    #[test]
    fn test_currency_filter_is_optional() {
        assert_eq!(currencies(None).predicates().len(), 1);
        assert_eq!(currencies(Some("usd")).predicates().len(), 2);
    }
}
