use std::collections::BTreeSet;

use anyhow::Result;

use crate::analyzers::rules::Tally;
use crate::analyzers::Analyzer;
use crate::core::types::{NetworkRequestRecord, NetworkSummary};
use crate::core::url::hostname_of;

pub const NETWORK_CAP: u8 = 20;

const MAX_DISTINCT_HOSTS: usize = 10;

pub struct NetworkAnalyzer;

impl NetworkAnalyzer {
    /// Distinct request hostnames and total request count, for reporting.
    pub fn summarize(&self, requests: &[NetworkRequestRecord]) -> NetworkSummary {
        NetworkSummary {
            total_requests: requests.len(),
            domains: distinct_hosts(requests).into_iter().collect(),
        }
    }
}

impl Analyzer for NetworkAnalyzer {
    type Input = [NetworkRequestRecord];

    fn name(&self) -> &'static str {
        "network"
    }

    fn cap(&self) -> u8 {
        NETWORK_CAP
    }

    fn analyze(&self, requests: &[NetworkRequestRecord]) -> Result<Tally> {
        let mut tally = Tally::default();

        let hosts = distinct_hosts(requests);
        if hosts.len() > MAX_DISTINCT_HOSTS {
            tally.add(10, format!("requests to many domains ({})", hosts.len()));
        }

        let foreign_scripts = requests.iter().filter(|r| is_foreign_script(r)).count();
        if foreign_scripts > 0 {
            tally.add(10, format!("suspicious external scripts ({foreign_scripts})"));
        }

        Ok(tally)
    }
}

fn distinct_hosts(requests: &[NetworkRequestRecord]) -> BTreeSet<String> {
    requests.iter().filter_map(|r| hostname_of(&r.url)).collect()
}

fn is_foreign_script(req: &NetworkRequestRecord) -> bool {
    if !req.resource_type.eq_ignore_ascii_case("script") {
        return false;
    }
    match hostname_of(&req.url) {
        Some(host) => !host.eq_ignore_ascii_case(req.originating_domain.trim()),
        None => false,
    }
}
