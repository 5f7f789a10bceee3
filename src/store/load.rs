//! Asynchronous loading through a [`DataProxy`].

use super::DataStore;
use crate::error::StoreError;
use crate::proxy::{proxy_for, DataProxy};
use tracing::{error, info};

impl DataStore {
    /// Fetch rows from `url` and replace the store's contents
    ///
    /// The url is remembered for [`DataStore::reload`] even if the fetch fails.
    pub async fn load(&self, url: &str) -> Result<usize, StoreError> {
        *self.shared.source.write() = Some(url.to_string());
        let proxy = proxy_for(url, &self.proxy_config())?;
        self.load_from(proxy.as_ref()).await
    }

    /// Repeat the last [`DataStore::load`]
    pub async fn reload(&self) -> Result<usize, StoreError> {
        let source = self.source().ok_or(StoreError::NoSource)?;
        self.load(&source).await
    }

    /// Replace the store's contents with whatever `proxy` yields
    pub async fn load_from(&self, proxy: &dyn DataProxy) -> Result<usize, StoreError> {
        let source = proxy.describe();
        let rows = match proxy.load().await {
            Ok(rows) => rows,
            Err(err) => {
                error!(source = %source, error = %err, "Failed to load rows");
                return Err(err.into());
            }
        };
        match self.set_data(rows) {
            Ok(count) => {
                info!(source = %source, count, "Loaded rows");
                Ok(count)
            }
            Err(err) => {
                error!(source = %source, error = %err, "Rejected loaded rows");
                Err(err)
            }
        }
    }
}
