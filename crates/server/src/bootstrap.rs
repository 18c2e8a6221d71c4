use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use treadline_core::config::{AppConfig, ConfigError, LoadOptions};
use treadline_notify::{Notifier, NotifyError};
use treadline_store::{
    BookingStore, PriceBook, PriceListError, PriceListSource, SheetsBookingStore,
    XlsxPriceListSource,
};

pub struct Application {
    pub config: AppConfig,
    pub price_book: Arc<PriceBook>,
    pub price_source: Arc<dyn PriceListSource>,
    pub bookings: Arc<dyn BookingStore>,
    pub notifier: Arc<dyn Notifier>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("price list load failed: {0}")]
    PriceList(#[from] PriceListError),
    #[error("notification channel setup failed: {0}")]
    Notify(#[from] NotifyError),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

/// Wire the application from an already-loaded configuration. The price list
/// is loaded eagerly so a missing or unreadable workbook fails startup
/// instead of surfacing on the first search.
pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let price_source: Arc<dyn PriceListSource> =
        Arc::new(XlsxPriceListSource::from_config(&config.pricelist));
    let products = price_source.load()?;
    let price_book = Arc::new(PriceBook::with_products(products));
    info!(
        event_name = "system.bootstrap.pricelist_loaded",
        correlation_id = "bootstrap",
        products = price_book.len(),
        path = %config.pricelist.path.display(),
        "price list loaded"
    );

    let bookings: Arc<dyn BookingStore> = Arc::new(SheetsBookingStore::from_config(&config.sheets));
    let notifier = treadline_notify::from_config(&config.notify)?;
    info!(
        event_name = "system.bootstrap.channels_ready",
        correlation_id = "bootstrap",
        notify_channel = notifier.channel_name(),
        "booking store and notification channel initialized"
    );

    Ok(Application { config, price_book, price_source, bookings, notifier })
}
