//! Common test utilities for the queue allocator

#![allow(dead_code)]

use qdma_resource::{GroupHandle, GroupKey, QueueRange, QueueRegistry, RegistryConfig, RequestPolicy};

pub const KEY: GroupKey = GroupKey::new(0x3b, 0x3b);

/// Registry with one group `[0, total)`.
pub fn registry(policy: RequestPolicy, total: u32) -> (QueueRegistry, GroupHandle) {
    let registry = QueueRegistry::new(RegistryConfig::new(policy));
    let group = registry.create_group(KEY, 0, total).expect("create group");
    (registry, group)
}

/// Assert free and held ranges tile `[qbase, qbase + total)` exactly.
pub fn assert_coverage(registry: &QueueRegistry, group: GroupHandle, functions: &[u16]) {
    let info = registry.group_info(group).expect("group info");
    let mut all: Vec<QueueRange> = registry.free_ranges(group).expect("free ranges");
    for f in functions {
        if let Some(r) = registry.query_range(group, *f).expect("query") {
            all.push(r);
        }
    }
    all.sort_by_key(|r| r.qbase);

    let mut next = info.qbase;
    for r in &all {
        assert!(r.count > 0, "empty range {}", r);
        assert_eq!(r.qbase, next, "gap or overlap at {} in {:?}", r, all);
        next = r.end();
    }
    assert_eq!(next, info.qbase + info.total, "coverage ends early: {:?}", all);
    assert!(registry.check_invariants(group).expect("invariants"));
}
