//! # Mailbox Engine Properties
//!
//! Exercises the engine through `MailboxApi` only.
//!
//! ## Test Categories
//!
//! 1. **Authorization** - superuser-only user edits, owner-only removal
//! 2. **Access lists** - public/secure inversion on both directions
//! 3. **Delivery models** - target-list collection, permission persistence
//! 4. **Failure atomicity** - rejected writes leave state untouched
//! 5. **Count invariant** - random operation sequences

use mailbox_core::{
    DeliveryModel, MailboxApi, MailboxConfig, MailboxError, MailboxKind, MailboxService,
    MailboxSpec, Privileges, RetrieveScope, UserId,
};
use proptest::prelude::*;

// =============================================================================
// TEST HELPERS
// =============================================================================

const ROOT: UserId = UserId::SUPERUSER;
const BUF: usize = 1024;

fn mask(bits: u8) -> Privileges {
    Privileges::from_mask(bits)
}

fn service_with_users(users: &[(u32, u8)]) -> MailboxService {
    let service = MailboxService::new();
    for (id, bits) in users {
        service.add_user(ROOT, UserId(*id), mask(*bits)).unwrap();
    }
    service
}

fn retrieve_any(service: &MailboxService, caller: u32) -> Result<Vec<u8>, MailboxError> {
    service.retrieve_message(UserId(caller), RetrieveScope::Any, BUF)
}

fn count_of(service: &MailboxService, name: &str) -> usize {
    service
        .mailbox_summaries()
        .into_iter()
        .find(|s| s.name == name)
        .map(|s| s.message_count)
        .unwrap()
}

// =============================================================================
// AUTHORIZATION
// =============================================================================

#[test]
fn test_only_superuser_edits_users() {
    let service = service_with_users(&[(1, 0b1111)]);

    // Even a fully privileged non-root user may not edit the registry
    assert!(matches!(
        service.add_user(UserId(1), UserId(2), mask(0)),
        Err(MailboxError::Unauthorized { .. })
    ));
    assert!(matches!(
        service.update_privileges(UserId(1), UserId(1), mask(0)),
        Err(MailboxError::Unauthorized { .. })
    ));
    assert!(matches!(
        service.remove_user(UserId(1), UserId(1)),
        Err(MailboxError::Unauthorized { .. })
    ));

    service.update_privileges(ROOT, UserId(1), mask(0b0001)).unwrap();
    assert!(matches!(
        service.add_user(ROOT, UserId(1), mask(0)),
        Err(MailboxError::AlreadyExists { .. })
    ));
    service.remove_user(ROOT, UserId(1)).unwrap();
    assert!(matches!(
        service.remove_user(ROOT, UserId(1)),
        Err(MailboxError::NotFound { .. })
    ));
    assert!(matches!(
        service.update_privileges(ROOT, UserId(1), mask(0)),
        Err(MailboxError::NotFound { .. })
    ));
    assert_eq!(service.list_users(), vec![(ROOT, Privileges::ALL)]);
}

#[test]
fn test_only_owner_or_superuser_removes_mailbox() {
    let service = service_with_users(&[(1, 0b1011), (2, 0b1111)]);
    service
        .create_mailbox(UserId(1), MailboxSpec::new("m", MailboxKind::Public))
        .unwrap();

    assert!(matches!(
        service.remove_mailbox(UserId(2), "m"),
        Err(MailboxError::Unauthorized { .. })
    ));
    service.remove_mailbox(UserId(1), "m").unwrap();

    service
        .create_mailbox(UserId(1), MailboxSpec::new("m", MailboxKind::Public))
        .unwrap();
    service.remove_mailbox(ROOT, "m").unwrap();
    assert!(matches!(
        service.remove_mailbox(ROOT, "m"),
        Err(MailboxError::NotFound { .. })
    ));
}

#[test]
fn test_mailbox_names_unique() {
    let service = service_with_users(&[(1, 0b1011)]);
    service
        .create_mailbox(UserId(1), MailboxSpec::new("m", MailboxKind::Public))
        .unwrap();

    for caller in [ROOT, UserId(1)] {
        assert!(matches!(
            service.create_mailbox(caller, MailboxSpec::new("m", MailboxKind::Secure)),
            Err(MailboxError::AlreadyExists { .. })
        ));
    }
    assert_eq!(service.mailbox_count(), 1);
    assert!(service.check_invariants().is_ok());
}

#[test]
fn test_create_capability_is_exact_mask() {
    let service = service_with_users(&[(1, 0b1001), (2, 0b1011), (3, 0b1111), (4, 0b1110)]);

    assert!(matches!(
        service.create_mailbox(UserId(1), MailboxSpec::new("a", MailboxKind::Public)),
        Err(MailboxError::Unauthorized { .. })
    ));
    assert!(matches!(
        service.create_mailbox(UserId(4), MailboxSpec::new("a", MailboxKind::Public)),
        Err(MailboxError::Unauthorized { .. })
    ));
    service
        .create_mailbox(UserId(2), MailboxSpec::new("b", MailboxKind::Public))
        .unwrap();
    service
        .create_mailbox(UserId(3), MailboxSpec::new("c", MailboxKind::Public))
        .unwrap();
}

#[test]
fn test_capability_bit_policy_is_configurable() {
    let config = MailboxConfig {
        create_policy: mailbox_core::CreatePolicy::CapabilityBit,
        ..Default::default()
    };
    let service = MailboxService::with_config(config);
    service.add_user(ROOT, UserId(1), mask(0b1001)).unwrap();

    service
        .create_mailbox(UserId(1), MailboxSpec::new("a", MailboxKind::Public))
        .unwrap();
}

// =============================================================================
// ACCESS LISTS
// =============================================================================

#[test]
fn test_public_secure_inversion_on_receive() {
    let service = service_with_users(&[(5, 0), (6, 0)]);
    service
        .create_mailbox(ROOT, MailboxSpec::new("s", MailboxKind::Secure).with_receivers("5"))
        .unwrap();
    service
        .create_mailbox(ROOT, MailboxSpec::new("p", MailboxKind::Public).with_receivers("5"))
        .unwrap();
    service.deposit_message(ROOT, "s", b"secure".to_vec(), None, None).unwrap();
    service.deposit_message(ROOT, "p", b"public".to_vec(), None, None).unwrap();

    assert_eq!(retrieve_any(&service, 5).unwrap(), b"secure");
    assert!(matches!(retrieve_any(&service, 5), Err(MailboxError::NoMessage { caller: 5 })));

    assert_eq!(retrieve_any(&service, 6).unwrap(), b"public");
    assert!(matches!(retrieve_any(&service, 6), Err(MailboxError::NoMessage { .. })));
}

#[test]
fn test_public_secure_inversion_on_send() {
    let service = service_with_users(&[(5, 0), (6, 0)]);
    service
        .create_mailbox(ROOT, MailboxSpec::new("s", MailboxKind::Secure).with_senders("5"))
        .unwrap();
    service
        .create_mailbox(ROOT, MailboxSpec::new("p", MailboxKind::Public).with_senders("5"))
        .unwrap();

    assert!(service.deposit_message(UserId(5), "s", b"x".to_vec(), None, None).is_ok());
    assert!(matches!(
        service.deposit_message(UserId(5), "p", b"x".to_vec(), None, None),
        Err(MailboxError::Forbidden { caller: 5, .. })
    ));
    assert!(matches!(
        service.deposit_message(UserId(6), "s", b"x".to_vec(), None, None),
        Err(MailboxError::Forbidden { caller: 6, .. })
    ));
    assert!(service.deposit_message(UserId(6), "p", b"x".to_vec(), None, None).is_ok());
}

#[test]
fn test_unknown_identities_skipped_at_create() {
    let service = service_with_users(&[(5, 0)]);
    let spec = MailboxSpec::new("m", MailboxKind::Secure)
        .with_senders("5 99 abc")
        .with_receivers("98");
    service.create_mailbox(ROOT, spec).unwrap();

    let summary = &service.mailbox_summaries()[0];
    assert_eq!(summary.senders, vec![UserId(5)]);
    assert!(summary.receivers.is_empty());
}

// =============================================================================
// DELIVERY MODELS
// =============================================================================

#[test]
fn test_target_list_garbage_collection() {
    let service = MailboxService::new();
    let spec = MailboxSpec::new("t", MailboxKind::Public)
        .with_delivery_model(DeliveryModel::TargetList);
    service.create_mailbox(ROOT, spec).unwrap();
    let before = count_of(&service, "t");

    service
        .deposit_message(ROOT, "t", b"hello".to_vec(), None, Some(vec![UserId(7), UserId(8)]))
        .unwrap();

    assert_eq!(retrieve_any(&service, 7).unwrap(), b"hello");
    assert_eq!(count_of(&service, "t"), before + 1);

    assert_eq!(retrieve_any(&service, 8).unwrap(), b"hello");
    assert_eq!(count_of(&service, "t"), before);
    assert!(service.check_invariants().is_ok());
}

#[test]
fn test_permission_messages_persist_until_deleted() {
    let service = service_with_users(&[(4, 0b0100)]);
    service
        .create_mailbox(ROOT, MailboxSpec::new("m", MailboxKind::Public))
        .unwrap();
    service
        .deposit_message(ROOT, "m", b"news".to_vec(), Some("daily".into()), None)
        .unwrap();

    for reader in [5, 6, 7] {
        assert_eq!(retrieve_any(&service, reader).unwrap(), b"news");
    }
    assert_eq!(count_of(&service, "m"), 1);

    service.delete_message(UserId(4), "m", "daily").unwrap();
    assert_eq!(count_of(&service, "m"), 0);
    assert!(matches!(retrieve_any(&service, 8), Err(MailboxError::NoMessage { .. })));
}

#[test]
fn test_any_scope_scans_directory_order() {
    let service = MailboxService::new();
    for name in ["first", "second"] {
        service
            .create_mailbox(ROOT, MailboxSpec::new(name, MailboxKind::Public))
            .unwrap();
    }
    service.deposit_message(ROOT, "second", b"2".to_vec(), None, None).unwrap();
    service.deposit_message(ROOT, "first", b"1".to_vec(), None, None).unwrap();

    assert_eq!(retrieve_any(&service, 3).unwrap(), b"1");
    assert_eq!(retrieve_any(&service, 3).unwrap(), b"2");
}

#[test]
fn test_removed_mailbox_messages_gone() {
    let service = MailboxService::new();
    service
        .create_mailbox(ROOT, MailboxSpec::new("m", MailboxKind::Public))
        .unwrap();
    service.deposit_message(ROOT, "m", b"x".to_vec(), None, None).unwrap();
    service.remove_mailbox(ROOT, "m").unwrap();

    assert!(matches!(retrieve_any(&service, 3), Err(MailboxError::NoMessage { .. })));
    service
        .create_mailbox(ROOT, MailboxSpec::new("m", MailboxKind::Public))
        .unwrap();
    assert_eq!(count_of(&service, "m"), 0);
}

// =============================================================================
// FAILURE ATOMICITY
// =============================================================================

#[test]
fn test_full_mailbox_unchanged() {
    let service = MailboxService::new();
    service
        .create_mailbox(ROOT, MailboxSpec::new("m", MailboxKind::Public))
        .unwrap();
    for i in 0..16u8 {
        service.deposit_message(ROOT, "m", vec![i; 3], None, None).unwrap();
    }
    let before = service.mailbox_summaries();

    assert!(matches!(
        service.deposit_message(ROOT, "m", b"overflow".to_vec(), None, None),
        Err(MailboxError::MailboxFull { capacity: 16, .. })
    ));
    assert_eq!(service.mailbox_summaries(), before);

    for i in 0..16u8 {
        assert_eq!(retrieve_any(&service, 9).unwrap(), vec![i; 3]);
    }
}

#[test]
fn test_oversized_body_rejected() {
    let service = MailboxService::new();
    service
        .create_mailbox(ROOT, MailboxSpec::new("m", MailboxKind::Public))
        .unwrap();

    assert!(service.deposit_message(ROOT, "m", vec![0; 1024], None, None).is_ok());
    assert!(matches!(
        service.deposit_message(ROOT, "m", vec![0; 1025], None, None),
        Err(MailboxError::PayloadTooLarge { size: 1025, max: 1024 })
    ));
    assert_eq!(count_of(&service, "m"), 1);
}

#[test]
fn test_failed_create_leaves_directory_untouched() {
    let service = service_with_users(&[(1, 0b1001)]);
    let _ = service.create_mailbox(UserId(1), MailboxSpec::new("m", MailboxKind::Public));
    let _ = service.create_mailbox(ROOT, MailboxSpec::new("bad name", MailboxKind::Public));
    assert!(service.mailbox_summaries().is_empty());
}

#[test]
fn test_failed_delivery_consumes_nothing() {
    let service = MailboxService::new();
    let spec = MailboxSpec::new("t", MailboxKind::Public)
        .with_delivery_model(DeliveryModel::TargetList);
    service.create_mailbox(ROOT, spec).unwrap();
    service
        .deposit_message(ROOT, "t", b"once".to_vec(), None, Some(vec![UserId(7)]))
        .unwrap();
    let before = service.mailbox_summaries();

    let mut unwritable = |_: &[u8]| -> Result<usize, MailboxError> {
        Err(MailboxError::Transfer {
            reason: "unwritable".into(),
        })
    };
    assert!(matches!(
        service.retrieve_message_with(UserId(7), RetrieveScope::Any, BUF, &mut unwritable),
        Err(MailboxError::Transfer { .. })
    ));
    assert_eq!(service.mailbox_summaries(), before);

    // Same rule for the basic queue
    service.queue_deposit(ROOT, b"q".to_vec(), "7").unwrap();
    assert!(service.queue_retrieve_with(UserId(7), BUF, &mut unwritable).is_err());
    assert_eq!(service.queue().count(), 1);

    assert_eq!(retrieve_any(&service, 7).unwrap(), b"once");
    assert_eq!(count_of(&service, "t"), 0);
    assert_eq!(service.queue_retrieve(UserId(7), BUF).unwrap(), b"q");
    assert!(service.check_invariants().is_ok());
}

#[test]
fn test_rejected_acl_edit_leaves_lists_untouched() {
    let service = service_with_users(&[(1, 0b1011), (2, 0b0000)]);
    let spec = MailboxSpec::new("m", MailboxKind::Secure)
        .with_senders("1")
        .with_receivers("2");
    service.create_mailbox(UserId(1), spec).unwrap();
    let before = service.mailbox_summaries();

    assert!(matches!(
        service.add_sender(UserId(1), "m", UserId(1)),
        Err(MailboxError::AlreadyExists { .. })
    ));
    assert!(matches!(
        service.add_receiver(UserId(1), "m", UserId(2)),
        Err(MailboxError::AlreadyExists { .. })
    ));
    assert!(matches!(
        service.remove_sender(UserId(1), "m", UserId(9)),
        Err(MailboxError::NotFound { .. })
    ));
    assert!(matches!(
        service.remove_receiver(UserId(1), "m", UserId(9)),
        Err(MailboxError::NotFound { .. })
    ));
    // No modify capability
    assert!(matches!(
        service.add_receiver(UserId(2), "m", UserId(3)),
        Err(MailboxError::Unauthorized { .. })
    ));

    assert_eq!(service.mailbox_summaries(), before);
}

#[test]
fn test_message_without_subject_deletable() {
    let service = service_with_users(&[(4, 0b0100)]);
    service
        .create_mailbox(ROOT, MailboxSpec::new("m", MailboxKind::Public))
        .unwrap();
    for _ in 0..16 {
        service.deposit_message(ROOT, "m", b"x".to_vec(), None, None).unwrap();
    }
    assert!(matches!(
        service.deposit_message(ROOT, "m", b"x".to_vec(), None, None),
        Err(MailboxError::MailboxFull { .. })
    ));

    service.delete_message(UserId(4), "m", "").unwrap();
    assert_eq!(count_of(&service, "m"), 15);
    assert!(service.deposit_message(ROOT, "m", b"x".to_vec(), None, None).is_ok());
}

// =============================================================================
// END TO END
// =============================================================================

#[test]
fn test_secure_mailbox_scenario() {
    let service = service_with_users(&[(1, 0b1011), (5, 0b0000)]);
    // Owners are not implicitly on a secure send list
    let spec = MailboxSpec::new("m", MailboxKind::Secure)
        .with_senders("1")
        .with_receivers("5");
    service.create_mailbox(UserId(1), spec).unwrap();

    service
        .deposit_message(UserId(1), "m", b"hi".to_vec(), Some("greeting".into()), None)
        .unwrap();

    assert_eq!(retrieve_any(&service, 5).unwrap(), b"hi");
    assert!(matches!(retrieve_any(&service, 5), Err(MailboxError::NoMessage { caller: 5 })));
    assert!(service.check_invariants().is_ok());
}

#[test]
fn test_secure_owner_without_send_entry_forbidden() {
    let service = service_with_users(&[(1, 0b1011), (5, 0b0000)]);
    let spec = MailboxSpec::new("m", MailboxKind::Secure).with_receivers("5");
    service.create_mailbox(UserId(1), spec).unwrap();

    assert!(matches!(
        service.deposit_message(UserId(1), "m", b"hi".to_vec(), None, None),
        Err(MailboxError::Forbidden { caller: 1, .. })
    ));
    service.add_sender(UserId(1), "m", UserId(1)).unwrap();
    service.deposit_message(UserId(1), "m", b"hi".to_vec(), None, None).unwrap();
    assert_eq!(retrieve_any(&service, 5).unwrap(), b"hi");
}

// =============================================================================
// COUNT INVARIANT
// =============================================================================

#[derive(Clone, Debug)]
enum Step {
    Deposit { subject: u8, len: usize },
    Retrieve { caller: u32 },
    Delete { subject: u8 },
    TargetDeposit { recipients: Vec<u32> },
    TargetRetrieve { caller: u32 },
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0u8..4, 0usize..1100).prop_map(|(subject, len)| Step::Deposit { subject, len }),
        (1u32..5).prop_map(|caller| Step::Retrieve { caller }),
        (0u8..4).prop_map(|subject| Step::Delete { subject }),
        proptest::collection::vec(1u32..5, 0..4)
            .prop_map(|recipients| Step::TargetDeposit { recipients }),
        (1u32..5).prop_map(|caller| Step::TargetRetrieve { caller }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    })]

    #[test]
    fn count_stays_bounded(steps in proptest::collection::vec(step(), 1..80)) {
        let service = MailboxService::new();
        service
            .create_mailbox(ROOT, MailboxSpec::new("p", MailboxKind::Public))
            .unwrap();
        let target = MailboxSpec::new("t", MailboxKind::Public)
            .with_delivery_model(DeliveryModel::TargetList);
        service.create_mailbox(ROOT, target).unwrap();

        for step in steps {
            let _ = match step {
                Step::Deposit { subject, len } => service.deposit_message(
                    ROOT,
                    "p",
                    vec![0; len],
                    Some(subject.to_string()),
                    None,
                ),
                Step::Retrieve { caller } => service
                    .retrieve_message(UserId(caller), RetrieveScope::Named("p".into()), BUF)
                    .map(|_| ()),
                Step::Delete { subject } => service.delete_message(ROOT, "p", &subject.to_string()),
                Step::TargetDeposit { recipients } => service.deposit_message(
                    ROOT,
                    "t",
                    b"t".to_vec(),
                    None,
                    Some(recipients.into_iter().map(UserId).collect()),
                ),
                Step::TargetRetrieve { caller } => service
                    .retrieve_message(UserId(caller), RetrieveScope::Named("t".into()), BUF)
                    .map(|_| ()),
            };

            prop_assert!(service.check_invariants().is_ok());
            for summary in service.mailbox_summaries() {
                prop_assert!(summary.message_count <= 16);
            }
        }
    }
}
