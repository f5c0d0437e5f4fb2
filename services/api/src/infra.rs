use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use casora::associations::AssociationService;
use casora::config::PortalConfig;
use casora::domain::{Contact, ContactId, Modality, Property, PropertyId, TenantId};
use casora::portal::PortalService;
use casora::relations::RelationManager;
use casora::shares::ShareManager;
use casora::store::memory::MemoryStore;
use casora::store::StoreError;
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Core services wired to one document store.
#[derive(Clone)]
pub(crate) struct CoreServices {
    pub(crate) relations: Arc<RelationManager<MemoryStore, MemoryStore>>,
    pub(crate) associations: Arc<AssociationService<MemoryStore>>,
    pub(crate) shares: Arc<ShareManager<MemoryStore, MemoryStore>>,
    pub(crate) portal: Arc<PortalService<MemoryStore>>,
}

impl CoreServices {
    pub(crate) fn in_memory(store: Arc<MemoryStore>, portal: PortalConfig) -> Self {
        Self {
            relations: Arc::new(RelationManager::new(store.clone(), store.clone())),
            associations: Arc::new(AssociationService::new(store.clone())),
            shares: Arc::new(ShareManager::new(store.clone(), store.clone())),
            portal: Arc::new(PortalService::new(store, portal)),
        }
    }
}

fn listing(
    tenant: &str,
    id: &str,
    title: &str,
    modality: Modality,
    price_usd: u64,
    featured: bool,
) -> Property {
    Property {
        id: PropertyId::new(id),
        tenant_id: TenantId::new(tenant),
        title: title.to_string(),
        property_type: "departamento".to_string(),
        modality,
        bedrooms: 3,
        price_usd,
        price_pen: price_usd * 37 / 10,
        featured,
        owner_id: None,
    }
}

/// Two agencies with a handful of listings and contacts.
pub(crate) async fn seed_demo_data(store: &MemoryStore) -> Result<(), StoreError> {
    let properties = [
        listing("demo", "P1", "Casa con jardín en La Molina", Modality::Sale, 420_000, true),
        listing(
            "demo",
            "P123",
            "Departamento frente al mar en Miraflores",
            Modality::Sale,
            185_000,
            false,
        ),
        listing("demo", "P7", "Mini departamento en Surquillo", Modality::Rental, 650, false),
        listing("acme", "A1", "Penthouse en San Isidro", Modality::Sale, 610_000, true),
        listing("acme", "A2", "Oficina en Magdalena", Modality::Sale, 98_000, false),
        listing("acme", "A3", "Dúplex en Barranco", Modality::Sale, 185_000, false),
    ];
    for property in properties {
        store.create_property(property).await?;
    }

    let contacts = [
        Contact::new(TenantId::new("acme"), ContactId::new("C9"), "Rosa Quispe"),
        Contact::new(TenantId::new("demo"), ContactId::new("C1"), "Jorge Salazar"),
    ];
    for contact in contacts {
        store.create_contact(contact).await?;
    }
    Ok(())
}
