//! Page and parameter stability checks
//!
//! Runs before any injection: one refetch of the unmodified page to find
//! the dynamic zone, then one random value per parameter to find the
//! parameters whose value alone changes the page.

use crate::core::settings::RANDOM_PROBE_MAX;
use crate::sqli::dynamic::find_dynamic_content;
use crate::sqli::session::{Interrupt, ProbeSession};
use rand::Rng;

impl ProbeSession<'_> {
    /// Refetch the unmodified page and derive the session template.
    ///
    /// A failed refetch leaves the session unable to tell dynamic pages from
    /// injected ones, so it ends the scan as undetermined.
    pub(crate) async fn establish_template(&mut self) -> Result<(), Interrupt> {
        let response = match self.send(self.base.clone()).await? {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Dynamic content check failed for {}: {}", self.base.url, e);
                return Err(Interrupt::Undetermined(format!(
                    "dynamic content refetch failed: {}",
                    e
                )));
            }
        };
        let refetched = response.body_text();

        if self.comparator.exceeds(&refetched) || self.comparator.exceeds(&self.original_body) {
            tracing::debug!("Page too large for dynamic content detection, using raw baseline");
            return Ok(());
        }

        let ratio = self.comparator.ratio(&self.original_body, &refetched);
        if ratio >= self.config.similarity_ratio {
            tracing::debug!("Page is stable (similarity {:.3})", ratio);
            return Ok(());
        }

        tracing::info!("Dynamic page detected (similarity {:.3})", ratio);
        match find_dynamic_content(&self.original_body, &refetched) {
            Some(marking) => {
                tracing::debug!(
                    "Dynamic zone between {:?} and {:?}",
                    marking.prefix,
                    marking.suffix
                );
                self.template_body = marking.template(&self.original_body);
                self.marking = Some(marking);
            }
            None => {
                tracing::warn!("Could not delimit dynamic zone, page will be compared unmasked");
            }
        }
        Ok(())
    }

    /// Flag parameters whose value changes the page on its own
    pub(crate) async fn probe_dynamic_parameters(&mut self) -> Result<(), Interrupt> {
        let params = self.params.clone();
        for param in &params {
            let value = self.rng.random_range(0..RANDOM_PROBE_MAX).to_string();

            let Some((_, response)) = self.send_variation(param, &value).await? else {
                continue;
            };

            let ratio = self.template_ratio(&response.body_text());
            if ratio < self.config.similarity_ratio {
                tracing::info!("Dynamic parameter '{}' (similarity {:.3})", param.name, ratio);
                if !self.is_dynamic(&param.name) {
                    self.dynamic_params.push(param.name.clone());
                }
            }
        }
        Ok(())
    }
}
