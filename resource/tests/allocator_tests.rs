//! Queue range allocator tests

mod common;

use common::{assert_coverage, registry, KEY};
use qdma_resource::{
    GroupKey, QueueRange, QueueRegistry, QueueType, RegistryConfig, RequestPolicy, ResourceError,
};

#[test]
fn test_coverage_through_sequence() {
    let (reg, g) = registry(RequestPolicy::Transactional, 64);
    let funcs = [0u16, 1, 2];
    for f in funcs {
        reg.create_function(g, f).expect("create function");
    }
    assert_coverage(&reg, g, &funcs);

    assert_eq!(reg.request_range(g, 0, 16, None), Ok(Some(0)));
    assert_coverage(&reg, g, &funcs);
    assert_eq!(reg.request_range(g, 1, 8, None), Ok(Some(16)));
    assert_coverage(&reg, g, &funcs);
    assert_eq!(reg.request_range(g, 2, 8, Some(40)), Ok(Some(40)));
    assert_coverage(&reg, g, &funcs);
    assert_eq!(
        reg.free_ranges(g).expect("free"),
        [QueueRange::new(24, 16), QueueRange::new(48, 16)]
    );

    reg.request_range(g, 1, 20, None).expect("grow");
    assert_coverage(&reg, g, &funcs);
    reg.destroy_function(g, 2).expect("destroy");
    assert_coverage(&reg, g, &[0, 1]);
}

#[test]
fn test_release_all_restores_single_range() {
    let (reg, g) = registry(RequestPolicy::Transactional, 64);
    for (f, n) in [(0u16, 5u32), (1, 7), (2, 3), (3, 11)] {
        reg.create_function(g, f).expect("create");
        reg.request_range(g, f, n, None).expect("request");
    }
    for f in [2u16, 0, 3, 1] {
        reg.destroy_function(g, f).expect("destroy");
    }
    assert_eq!(reg.free_ranges(g).expect("free"), [QueueRange::new(0, 64)]);
}

#[test]
fn test_best_fit_picks_smallest_hole() {
    let (reg, g) = registry(RequestPolicy::Transactional, 21);
    // carve [0,10) [11,16) [17,20) as holes separated by single queues
    for (f, n) in [(0u16, 10u32), (1, 1), (2, 5), (3, 1), (4, 3), (5, 1)] {
        reg.create_function(g, f).expect("create");
        reg.request_range(g, f, n, None).expect("request");
    }
    for f in [0u16, 2, 4] {
        reg.destroy_function(g, f).expect("destroy");
    }
    assert_eq!(
        reg.free_ranges(g).expect("free"),
        [QueueRange::new(0, 10), QueueRange::new(11, 5), QueueRange::new(17, 3)]
    );

    reg.create_function(g, 6).expect("create");
    assert_eq!(reg.request_range(g, 6, 3, None), Ok(Some(17)));
    assert_coverage(&reg, g, &[1, 3, 5, 6]);
}

#[test]
fn test_hint_splits_free_range() {
    let reg = QueueRegistry::default();
    let g = reg.create_group(KEY, 16, 16).expect("group");
    reg.create_function(g, 0).expect("create");
    assert_eq!(reg.request_range(g, 0, 4, Some(20)), Ok(Some(20)));
    assert_eq!(
        reg.free_ranges(g).expect("free"),
        [QueueRange::new(16, 4), QueueRange::new(24, 8)]
    );
}

#[test]
fn test_hint_outside_free_space_uses_best_fit() {
    let (reg, g) = registry(RequestPolicy::Transactional, 32);
    reg.create_function(g, 0).expect("create");
    reg.create_function(g, 1).expect("create");
    reg.request_range(g, 0, 8, Some(0)).expect("first");
    assert_eq!(reg.request_range(g, 1, 4, Some(4)), Ok(Some(8)));
}

#[test]
fn test_active_queues_block_qmax_change() {
    let (reg, g) = registry(RequestPolicy::Transactional, 64);
    reg.create_function(g, 0).expect("create");
    reg.request_range(g, 0, 8, None).expect("request");
    reg.increment_active(g, 0, QueueType::H2c).expect("start");

    assert_eq!(
        reg.request_range(g, 0, 16, None),
        Err(ResourceError::QmaxChangeRejected)
    );
    assert_eq!(reg.query_range(g, 0), Ok(Some(QueueRange::new(0, 8))));

    reg.decrement_active(g, 0, QueueType::H2c).expect("stop");
    assert_eq!(reg.request_range(g, 0, 16, None), Ok(Some(0)));
    assert_coverage(&reg, g, &[0]);
}

#[test]
fn test_contains() {
    let (reg, g) = registry(RequestPolicy::Transactional, 32);
    reg.create_function(g, 0).expect("create");
    reg.create_function(g, 1).expect("create");
    reg.request_range(g, 0, 8, None).expect("request");
    assert_eq!(reg.request_range(g, 1, 4, Some(8)), Ok(Some(8)));

    assert!(reg.contains(g, 1, 8));
    assert!(reg.contains(g, 1, 11));
    assert!(!reg.contains(g, 1, 12));
    assert!(!reg.contains(g, 1, 7));
    assert!(!reg.contains(g, 9, 8));
}

#[test]
fn test_failed_request_transactional_keeps_state() {
    let (reg, g) = registry(RequestPolicy::Transactional, 16);
    reg.create_function(g, 0).expect("create");
    reg.create_function(g, 1).expect("create");
    reg.request_range(g, 0, 8, None).expect("request");
    reg.request_range(g, 1, 8, None).expect("request");
    let before = reg.free_ranges(g).expect("free");

    assert_eq!(
        reg.request_range(g, 0, 12, None),
        Err(ResourceError::NoQueuesLeft)
    );
    assert_eq!(reg.query_range(g, 0), Ok(Some(QueueRange::new(0, 8))));
    assert_eq!(reg.free_ranges(g).expect("free"), before);
    assert_coverage(&reg, g, &[0, 1]);
}

#[test]
fn test_failed_request_release_first_restores_old_range() {
    let (reg, g) = registry(RequestPolicy::ReleaseFirst, 16);
    reg.create_function(g, 0).expect("create");
    reg.create_function(g, 1).expect("create");
    reg.request_range(g, 0, 8, None).expect("request");
    reg.request_range(g, 1, 8, None).expect("request");

    assert_eq!(
        reg.request_range(g, 0, 12, None),
        Err(ResourceError::NoQueuesLeft)
    );
    assert_eq!(reg.query_range(g, 0), Ok(Some(QueueRange::new(0, 8))));
    assert_coverage(&reg, g, &[0, 1]);

    // shrinking succeeds and returns the remainder to the pool
    assert_eq!(reg.request_range(g, 0, 2, None), Ok(Some(0)));
    assert_eq!(reg.free_ranges(g).expect("free"), [QueueRange::new(2, 6)]);
    assert_coverage(&reg, g, &[0, 1]);
}

#[test]
fn test_zero_count_releases_range() {
    let (reg, g) = registry(RequestPolicy::Transactional, 16);
    reg.create_function(g, 0).expect("create");
    reg.request_range(g, 0, 8, None).expect("request");
    assert_eq!(reg.request_range(g, 0, 0, None), Ok(None));
    assert_eq!(reg.query_range(g, 0), Ok(None));
    assert_eq!(reg.free_ranges(g).expect("free"), [QueueRange::new(0, 16)]);
}

#[test]
fn test_update_function_reports_range() {
    let (reg, g) = registry(RequestPolicy::Transactional, 32);
    reg.create_function(g, 4).expect("create");
    assert_eq!(
        reg.update_function(g, 4, 6, Some(10)),
        Ok(Some(QueueRange::new(10, 6)))
    );
}

#[test]
fn test_active_accounting() {
    let (reg, g) = registry(RequestPolicy::Transactional, 16);
    reg.create_function(g, 0).expect("create");
    assert_eq!(
        reg.increment_active(g, 0, QueueType::C2h),
        Err(ResourceError::NotFound)
    );
    reg.request_range(g, 0, 2, None).expect("request");
    reg.increment_active(g, 0, QueueType::C2h).expect("c2h");
    reg.increment_active(g, 0, QueueType::Cmpt).expect("cmpt");
    assert_eq!(
        reg.increment_active(g, 0, QueueType::H2c),
        Err(ResourceError::NoQueuesLeft)
    );
    assert_eq!(reg.active_count(g), Ok(2));
    assert_eq!(reg.active_count_for_function(g, 0), Ok(2));
    assert_eq!(reg.active_queues(g, 0, QueueType::C2h), Ok(1));

    reg.decrement_active(g, 0, QueueType::C2h).expect("dec");
    reg.decrement_active(g, 0, QueueType::C2h).expect("saturating dec");
    assert_eq!(reg.active_count(g), Ok(1));
    assert_eq!(
        reg.increment_active(g, 7, QueueType::H2c),
        Err(ResourceError::NotFound)
    );
}

#[test]
fn test_destroy_function_with_active_queues_rejected() {
    let (reg, g) = registry(RequestPolicy::Transactional, 8);
    reg.create_function(g, 0).expect("f0");
    reg.create_function(g, 1).expect("f1");
    assert_eq!(reg.request_range(g, 0, 8, None), Ok(Some(0)));
    reg.increment_active(g, 0, QueueType::H2c).expect("active");

    assert_eq!(
        reg.destroy_function(g, 0),
        Err(ResourceError::QmaxChangeRejected)
    );
    assert_eq!(reg.query_range(g, 0), Ok(Some(QueueRange::new(0, 8))));
    assert_eq!(reg.active_count(g), Ok(1));
    assert!(reg.free_ranges(g).expect("free").is_empty());
    assert_eq!(
        reg.request_range(g, 1, 8, None),
        Err(ResourceError::NoQueuesLeft)
    );
    assert_coverage(&reg, g, &[0, 1]);

    reg.decrement_active(g, 0, QueueType::H2c).expect("dec");
    reg.destroy_function(g, 0).expect("destroy");
    assert_eq!(reg.active_count(g), Ok(0));
    assert_eq!(reg.request_range(g, 1, 8, None), Ok(Some(0)));
    assert_coverage(&reg, g, &[1]);
}

#[test]
fn test_group_lifecycle() {
    let reg = QueueRegistry::new(RegistryConfig::default());
    let a = reg.create_group(GroupKey::new(1, 1), 0, 128).expect("a");
    let b = reg.create_group(GroupKey::new(2, 3), 0, 128).expect("b");
    assert_eq!((a.index(), b.index()), (0, 1));
    assert_eq!(
        reg.create_group(GroupKey::new(1, 1), 0, 64),
        Err(ResourceError::AlreadyExists)
    );
    assert_eq!(reg.find_group(GroupKey::new(2, 3)), Some(b));
    assert_eq!(reg.find_group(GroupKey::new(9, 9)), None);

    reg.create_function(a, 0).expect("create");
    assert_eq!(reg.create_function(a, 0), Err(ResourceError::AlreadyExists));
    assert_eq!(reg.destroy_group(a), Err(ResourceError::NotEmpty));
    reg.destroy_function(a, 0).expect("destroy function");
    reg.destroy_group(a).expect("destroy group");
    assert_eq!(reg.group_info(a), Err(ResourceError::NotFound));

    // indices are never reused
    let again = reg.create_group(GroupKey::new(1, 1), 0, 128).expect("again");
    assert_eq!(again.index(), 2);
}

#[test]
fn test_invalid_group() {
    let reg = QueueRegistry::default();
    assert_eq!(
        reg.create_group(KEY, 0, 0),
        Err(ResourceError::InvalidParameter)
    );
    assert_eq!(
        reg.create_group(KEY, u32::MAX - 1, 4),
        Err(ResourceError::InvalidParameter)
    );
}

#[test]
fn test_concurrent_functions() {
    let (reg, g) = registry(RequestPolicy::Transactional, 1024);
    std::thread::scope(|s| {
        for f in 0..8u16 {
            let reg = &reg;
            s.spawn(move || {
                reg.create_function(g, f).expect("create");
                for n in [4u32, 16, 8, 32] {
                    reg.request_range(g, f, n, None).expect("request");
                }
            });
        }
    });
    let funcs: Vec<u16> = (0..8).collect();
    assert_coverage(&reg, g, &funcs);
    let info = reg.group_info(g).expect("info");
    assert_eq!(info.free, 1024 - 8 * 32);
    assert_eq!(info.functions, 8);
}
