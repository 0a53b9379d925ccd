//! MX resolution and recipient grouping

use mxpost_common::{EmailAddress, Envelope, Error, Result};
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

/// Recipients bound for one mail exchanger
#[derive(Debug, Clone)]
pub struct RecipientGroup {
    pub mx_host: String,
    pub recipients: Vec<EmailAddress>,
}

/// Resolves destination domains to their preferred mail exchanger
pub struct MxResolver {
    resolver: TokioAsyncResolver,
    lookup_timeout: Duration,
}

impl MxResolver {
    pub fn new(lookup_timeout: Duration) -> Self {
        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default()),
            lookup_timeout,
        }
    }

    /// Bucket every recipient (to, cc and bcc) by destination domain and
    /// resolve each domain's mail exchanger.
    pub async fn group_recipients(&self, envelope: &Envelope) -> Result<Vec<RecipientGroup>> {
        let mut groups = Vec::new();
        for (domain, recipients) in group_by_domain(envelope) {
            let mx_host = self.resolve(&domain).await?;
            debug!("Resolved {} to mail exchanger {}", domain, mx_host);
            groups.push(RecipientGroup {
                mx_host,
                recipients,
            });
        }
        Ok(groups)
    }

    async fn resolve(&self, domain: &str) -> Result<String> {
        let lookup = match timeout(self.lookup_timeout, self.resolver.mx_lookup(domain)).await {
            Ok(Ok(lookup)) => lookup,
            Ok(Err(e)) => return Err(Error::MxResolution(format!("{}: {}", domain, e))),
            Err(_) => {
                return Err(Error::MxResolution(format!(
                    "{}: MX lookup timed out after {:?}",
                    domain, self.lookup_timeout
                )))
            }
        };

        let records: Vec<(u16, String)> = lookup
            .iter()
            .map(|mx| (mx.preference(), mx.exchange().to_ascii()))
            .collect();

        pick_exchange(records)
            .ok_or_else(|| Error::MxResolution(format!("{}: no MX records", domain)))
    }
}

/// Merge to, cc and bcc into per-domain buckets, keeping first-seen domain
/// order and recipient order within a bucket. Duplicate addresses collapse
/// so each recipient gets exactly one RCPT TO.
fn group_by_domain(envelope: &Envelope) -> Vec<(String, Vec<EmailAddress>)> {
    let mut buckets: Vec<(String, Vec<EmailAddress>)> = Vec::new();
    for rcpt in envelope.all_recipients() {
        match buckets.iter_mut().find(|(domain, _)| *domain == rcpt.domain) {
            Some((_, list)) => {
                if !list.iter().any(|existing| existing == rcpt) {
                    list.push(rcpt.clone());
                }
            }
            None => buckets.push((rcpt.domain.clone(), vec![rcpt.clone()])),
        }
    }
    buckets
}

/// Lowest preference wins; ties keep record order. The exchange name loses
/// its trailing root dot so it can be dialed and used as SNI.
fn pick_exchange(mut records: Vec<(u16, String)>) -> Option<String> {
    records.sort_by_key(|(preference, _)| *preference);
    records
        .into_iter()
        .next()
        .map(|(_, host)| host.trim_end_matches('.').to_string())
}
