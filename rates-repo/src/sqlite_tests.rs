//! SQLite repository integration tests.

#[cfg(test)]
mod tests {
    use rates_types::{
        Country, Currency, Document, DomainError, Entity, Join, Load, Media, Predicate,
        ProviderExchangeRate, ReferenceRepository, RepoError, Text, TransferProvider,
        TransferRule,
    };
    use uuid::Uuid;

    use crate::SqliteRepo;

    async fn setup_repo() -> SqliteRepo {
        SqliteRepo::new("sqlite::memory:", 1).await.unwrap()
    }

    struct Fixture {
        usd: Currency,
        eur: Currency,
        us: Country,
        de: Country,
        acme: TransferProvider,
    }

    async fn seed(repo: &SqliteRepo) -> Fixture {
        let usd = repo
            .insert(Currency::new("USD").with_name("US Dollar").with_symbol("$"))
            .await
            .unwrap();
        let eur = repo.insert(Currency::new("EUR")).await.unwrap();
        let us = repo
            .insert(Country::new("United States").with_local_currency(usd.id))
            .await
            .unwrap();
        let de = repo
            .insert(Country::new("Germany").with_abbreviation("DE").with_local_currency(eur.id))
            .await
            .unwrap();
        let acme = repo
            .insert(TransferProvider::new("Acme", "https://acme.example"))
            .await
            .unwrap();
        Fixture {
            usd,
            eur,
            us,
            de,
            acme,
        }
    }

    fn rule(f: &Fixture) -> TransferRule {
        TransferRule::new(f.acme.id, f.us.id, f.de.id, f.usd.id, "bank_transfer")
            .with_fees(Some(1.5), Some(2.99))
            .with_amounts(10.0, Some(5000.0))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Active filtering
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_active_by_id_returns_stored_scalars() {
        let repo = setup_repo().await;
        let f = seed(&repo).await;

        let fetched = repo
            .fetch_optional(Currency::active().by_id(f.usd.id()))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(fetched, f.usd);
        assert_ne!(fetched.id(), Uuid::nil());
    }

    #[tokio::test]
    async fn test_inactive_row_is_not_found() {
        let repo = setup_repo().await;
        let hidden = repo
            .insert(Currency::new("XAU").deactivated())
            .await
            .unwrap();

        let fetched = repo
            .fetch_optional(Currency::active().by_id(hidden.id()))
            .await
            .unwrap();
        assert!(fetched.is_none());

        // Still present without the active filter.
        let all = repo
            .fetch_all(rates_types::Select::<Currency>::all().by_id(hidden.id()))
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_set_active_toggles_visibility() {
        let repo = setup_repo().await;
        let f = seed(&repo).await;

        assert!(repo.set_active::<Currency>(f.eur.id(), false).await.unwrap());
        let active = repo.fetch_all(Currency::active()).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].abbreviation, "USD");

        assert!(!repo.set_active::<Currency>(Uuid::new_v4(), false).await.unwrap());
    }

    #[tokio::test]
    async fn test_eq_filter() {
        let repo = setup_repo().await;
        seed(&repo).await;

        let found = repo
            .fetch_all(Country::active().filter(Predicate::eq("abbreviation", "DE")))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Germany");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Eager loading
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_provider_with_only_inactive_rules_loads_empty_collection() {
        let repo = setup_repo().await;
        let f = seed(&repo).await;
        repo.insert(rule(&f).deactivated()).await.unwrap();

        let providers = repo
            .fetch_all(
                TransferProvider::active().load(Load::active(TransferProvider::TRANSFER_RULES)),
            )
            .await
            .unwrap();

        assert_eq!(providers.len(), 1);
        let rules = providers[0].transfer_rules.loaded().unwrap();
        assert!(rules.is_empty());
        assert!(!providers[0].exchange_rates.is_loaded());
    }

    #[tokio::test]
    async fn test_selectin_load_with_nested_single_loads() {
        let repo = setup_repo().await;
        let f = seed(&repo).await;
        repo.insert(rule(&f)).await.unwrap();
        repo.insert(rule(&f).with_fees(None, None)).await.unwrap();

        let providers = repo
            .fetch_all(
                TransferProvider::active().load(
                    Load::active(TransferProvider::TRANSFER_RULES)
                        .load(Load::new(TransferRule::SEND_COUNTRY))
                        .load(Load::new(TransferRule::TRANSFER_CURRENCY)),
                ),
            )
            .await
            .unwrap();

        let rules = providers[0].transfer_rules.loaded().unwrap();
        assert_eq!(rules.len(), 2);
        for rule in rules {
            let send = rule.send_country.require_some("send_country").unwrap();
            assert_eq!(send.name, "United States");
            let currency = rule.transfer_currency.require_some("transfer_currency").unwrap();
            assert_eq!(currency.abbreviation, "USD");
            assert!(!rule.receive_country.is_loaded());
        }
    }

    #[tokio::test]
    async fn test_joined_documents_do_not_duplicate_rule() {
        let repo = setup_repo().await;
        let f = seed(&repo).await;
        let stored = repo.insert(rule(&f)).await.unwrap();

        for name in ["Passport", "Proof of address", "Utility bill"] {
            let doc = repo.insert(Document::new(name)).await.unwrap();
            repo.link(TransferRule::REQUIRED_DOCUMENTS, stored.id(), doc.id())
                .await
                .unwrap();
        }
        let retired = repo.insert(Document::new("Old form").deactivated()).await.unwrap();
        repo.link(TransferRule::REQUIRED_DOCUMENTS, stored.id(), retired.id())
            .await
            .unwrap();

        let rules = repo
            .fetch_all(
                TransferRule::active()
                    .join(
                        Join::new(TransferRule::SEND_COUNTRY).then(Join::new(Country::LOCAL_CURRENCY)),
                    )
                    .join(Join::new(TransferRule::PROVIDER))
                    .join(Join::active(TransferRule::REQUIRED_DOCUMENTS)),
            )
            .await
            .unwrap();

        assert_eq!(rules.len(), 1);
        let docs = rules[0].required_documents.loaded().unwrap();
        assert_eq!(docs.len(), 3);

        let send = rules[0].send_country.require_some("send_country").unwrap();
        let local = send.local_currency.require_some("local_currency").unwrap();
        assert_eq!(local.abbreviation, "USD");
        assert_eq!(
            rules[0].provider.require_some("provider").unwrap().name,
            "Acme"
        );
    }

    #[tokio::test]
    async fn test_has_active_excludes_rates_of_inactive_provider() {
        let repo = setup_repo().await;
        let f = seed(&repo).await;
        let closed = repo
            .insert(TransferProvider::new("Closed", "https://closed.example").deactivated())
            .await
            .unwrap();

        repo.insert(ProviderExchangeRate::new(f.acme.id, f.usd.id, f.eur.id, 0.91))
            .await
            .unwrap();
        repo.insert(ProviderExchangeRate::new(closed.id, f.usd.id, f.eur.id, 0.93))
            .await
            .unwrap();

        let rates = repo
            .fetch_all(
                ProviderExchangeRate::active()
                    .filter(Predicate::has_active(ProviderExchangeRate::PROVIDER))
                    .join(Join::new(ProviderExchangeRate::PROVIDER)),
            )
            .await
            .unwrap();

        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].rate, 0.91);
    }

    #[tokio::test]
    async fn test_fetch_each_keeps_undecodable_row_in_its_slot() {
        let repo = setup_repo().await;
        let f = seed(&repo).await;
        let good = repo
            .insert(ProviderExchangeRate::new(f.acme.id, f.usd.id, f.eur.id, 0.91))
            .await
            .unwrap();
        let bad = repo
            .insert(ProviderExchangeRate::new(f.acme.id, f.eur.id, f.usd.id, 1.09))
            .await
            .unwrap();

        sqlx::query("UPDATE provider_exchange_rates SET last_updated = 'yesterday' WHERE id = ?")
            .bind(bad.id.to_string())
            .execute(repo.pool())
            .await
            .unwrap();

        let select = || {
            ProviderExchangeRate::active()
                .join(Join::new(ProviderExchangeRate::PROVIDER))
                .join(Join::new(ProviderExchangeRate::FROM_CURRENCY))
                .join(Join::new(ProviderExchangeRate::TO_CURRENCY))
        };

        let rows = repo.fetch_each(select()).await.unwrap();
        assert_eq!(rows.len(), 2);
        for (id, decoded) in &rows {
            if *id == good.id() {
                assert_eq!(decoded.as_ref().unwrap().rate, 0.91);
            } else {
                assert_eq!(*id, bad.id());
                assert!(decoded.is_err());
            }
        }

        // The strict read still refuses the whole result.
        assert!(repo.fetch_all(select()).await.is_err());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_insert_stamps_last_updated() {
        let repo = setup_repo().await;
        let f = seed(&repo).await;

        let rate = repo
            .insert(ProviderExchangeRate::new(f.acme.id, f.usd.id, f.eur.id, 0.91))
            .await
            .unwrap();
        assert_eq!(rate.last_updated, rate.created_at);

        let fetched = repo
            .fetch_optional(ProviderExchangeRate::active().by_id(rate.id()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.last_updated, rate.last_updated);
    }

    #[tokio::test]
    async fn test_insert_assigns_fresh_id() {
        let repo = setup_repo().await;

        let mut preset = Document::new("Passport");
        preset.id = rates_types::DocumentId::from_uuid(Uuid::new_v4());
        let first = repo.insert(preset.clone()).await.unwrap();
        let second = repo.insert(Document::new("Visa")).await.unwrap();

        assert!(!first.id().is_nil());
        assert_ne!(first.id, preset.id);
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_duplicate_rate_conflicts() {
        let repo = setup_repo().await;
        let f = seed(&repo).await;

        repo.insert(ProviderExchangeRate::new(f.acme.id, f.usd.id, f.eur.id, 0.91))
            .await
            .unwrap();
        let result = repo
            .insert(ProviderExchangeRate::new(f.acme.id, f.usd.id, f.eur.id, 0.92))
            .await;

        assert!(matches!(result, Err(RepoError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_non_positive_rate_rejected_before_storage() {
        let repo = setup_repo().await;
        let f = seed(&repo).await;

        let result = repo
            .insert(ProviderExchangeRate::new(f.acme.id, f.usd.id, f.eur.id, 0.0))
            .await;

        assert!(matches!(
            result,
            Err(RepoError::Domain(DomainError::ValidationError(_)))
        ));
    }

    #[tokio::test]
    async fn test_text_media_link_limit() {
        let repo = setup_repo().await;
        let text = repo
            .insert(Text::new("home_banner", "Send money abroad"))
            .await
            .unwrap();

        for i in 0..10 {
            let media = repo
                .insert(Media::new(format!("media/{i}.png"), "image"))
                .await
                .unwrap();
            repo.link(Text::MEDIA_FILES, text.id(), media.id())
                .await
                .unwrap();
        }

        let extra = repo.insert(Media::new("media/extra.png", "image")).await.unwrap();
        let result = repo.link(Text::MEDIA_FILES, text.id(), extra.id()).await;
        assert!(matches!(result, Err(RepoError::Conflict(_))));

        let texts = repo
            .fetch_all(Text::active().load(Load::new(Text::MEDIA_FILES)))
            .await
            .unwrap();
        assert_eq!(texts[0].media_files.loaded().map(Vec::len), Some(10));
    }

    #[tokio::test]
    async fn test_duplicate_link_conflicts() {
        let repo = setup_repo().await;
        let f = seed(&repo).await;
        let stored = repo.insert(rule(&f)).await.unwrap();
        let doc = repo.insert(Document::new("Passport")).await.unwrap();

        repo.link(TransferRule::REQUIRED_DOCUMENTS, stored.id(), doc.id())
            .await
            .unwrap();
        let again = repo
            .link(TransferRule::REQUIRED_DOCUMENTS, stored.id(), doc.id())
            .await;
        assert!(matches!(again, Err(RepoError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_link_rejects_non_association_relation() {
        let repo = setup_repo().await;
        let result = repo
            .link(TransferRule::PROVIDER, Uuid::new_v4(), Uuid::new_v4())
            .await;
        assert!(matches!(
            result,
            Err(RepoError::Domain(DomainError::ValidationError(_)))
        ));
    }
}
