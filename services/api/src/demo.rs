use crate::infra::{seed_demo_data, CoreServices};
use casora::associations::AssociationKind;
use casora::config::PortalConfig;
use casora::domain::{ClientId, ContactId, Currency, Modality, PropertyId, TenantId};
use casora::error::{AppError, DomainError};
use casora::portal::ListingQuery;
use casora::relations::{AgentLink, FavoriteOutcome, RelationFilter, RelationRole, RelationStatus};
use casora::shares::SharedProperty;
use casora::store::memory::MemoryStore;
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Portal page size used for the listing walkthrough
    #[arg(long, default_value_t = 2)]
    pub(crate) page_size: usize,
    /// Minimum USD price for the portal walkthrough
    #[arg(long, default_value_t = 100_000)]
    pub(crate) min_price: u64,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let store = Arc::new(MemoryStore::new());
    seed_demo_data(&store).await.map_err(DomainError::from)?;
    let core = CoreServices::in_memory(store, PortalConfig::default());

    println!("Casora core walkthrough");
    favorites(&core).await?;
    agent_link(&core).await?;
    associations(&core).await?;
    portal(&core, &args).await?;
    shares(&core).await?;
    Ok(())
}

async fn favorites(core: &CoreServices) -> Result<(), AppError> {
    println!("\nClient favorites (tenant demo)");
    let demo = TenantId::new("demo");
    let property = PropertyId::new("P123");
    let client = ClientId::new("clientA");

    for attempt in 1..=2 {
        let outcome = core
            .relations
            .create_from_favorite(&demo, &property, &client, true)
            .await?;
        let label = match outcome {
            FavoriteOutcome::Created(_) => "created",
            FavoriteOutcome::AlreadyExists(_) => "already recorded",
            FavoriteOutcome::SkippedNoConsent => "skipped",
        };
        println!("- attempt {attempt}: {label}");
    }

    let outcome = core
        .relations
        .create_from_favorite(&demo, &property, &ClientId::new("clientB"), false)
        .await?;
    if outcome == FavoriteOutcome::SkippedNoConsent {
        println!("- clientB without consent: skipped");
    }

    let stored = core
        .relations
        .relations(&demo, &RelationFilter::default())
        .await?;
    println!("- relations stored in demo: {}", stored.len());
    Ok(())
}

async fn agent_link(core: &CoreServices) -> Result<(), AppError> {
    println!("\nAgent link (acme contact -> demo property)");
    let relation = core
        .relations
        .create_from_agent_link(AgentLink {
            agent_tenant_id: TenantId::new("acme"),
            contact_id: ContactId::new("C9"),
            property_tenant_id: TenantId::new("demo"),
            property_id: PropertyId::new("P1"),
            role: RelationRole::Owner,
            status: RelationStatus::New,
        })
        .await?;
    println!(
        "- filed in {} pointing at {}/{} as {:?}",
        relation.tenant_id, relation.property_tenant_id, relation.property_id, relation.role
    );
    Ok(())
}

async fn associations(core: &CoreServices) -> Result<(), AppError> {
    println!("\nContact associations (tenant demo)");
    let demo = TenantId::new("demo");
    let contact = ContactId::new("C1");
    let property = PropertyId::new("P1");

    for kind in [AssociationKind::Owner, AssociationKind::Interested] {
        let change = core
            .associations
            .set_association(&demo, &contact, &property, kind)
            .await?;
        println!("- {:?} -> {:?}", change.previous, change.current);
    }
    let change = core
        .associations
        .disassociate(&demo, &contact, &property)
        .await?;
    println!("- {:?} -> {:?}", change.previous, change.current);
    Ok(())
}

async fn portal(core: &CoreServices, args: &DemoArgs) -> Result<(), AppError> {
    println!(
        "\nPortal: sales from {} USD, {} per page",
        args.min_price, args.page_size
    );
    let query = ListingQuery {
        modality: Some(Modality::Sale),
        min_price: Some(args.min_price),
        currency: Some(Currency::Usd),
        ..ListingQuery::default()
    };

    let mut cursor: Option<String> = None;
    let mut page_number = 1;
    loop {
        let page = core
            .portal
            .list(&query, cursor.as_deref(), Some(args.page_size))
            .await?;
        println!("Page {page_number}");
        for property in &page.properties {
            println!(
                "  - {}/{} {} ({} USD)",
                property.tenant_id, property.id, property.title, property.price_usd
            );
        }
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
        page_number += 1;
    }
    Ok(())
}

async fn shares(core: &CoreServices) -> Result<(), AppError> {
    println!("\nShared list");
    let acme = TenantId::new("acme");
    let handle = core
        .shares
        .create_share_list(
            &acme,
            vec![
                SharedProperty {
                    property_tenant_id: acme.clone(),
                    property_id: PropertyId::new("A1"),
                },
                SharedProperty {
                    property_tenant_id: TenantId::new("demo"),
                    property_id: PropertyId::new("P1"),
                },
            ],
            "agent-acme",
            Some(ContactId::new("C9")),
        )
        .await?;
    println!("- created {} with a {}-char token", handle.share_id, handle.token.len());

    let view = core.shares.open(&handle.token).await?;
    println!(
        "- opened: {} properties, {} missing",
        view.properties.len(),
        view.missing
    );

    core.shares.revoke(&acme, &handle.share_id).await?;
    let after = core.shares.get_by_token(&handle.token).await?;
    println!("- after revoke the token resolves: {}", after.is_some());
    Ok(())
}
