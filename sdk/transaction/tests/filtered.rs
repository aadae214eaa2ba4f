use meridian_crypto::{MerkleProof, MerkleProofType, MerkleTreeHashDigestProvider};
use meridian_transaction::{
    ComponentGroup, DigestSettings, Disclosure, FilterError, FilteredData, FilteredTransaction,
    FilteredTransactionBuilder, FilteredTransactionError, PrivacySalt, TransactionMetadata,
    WireTransaction,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn salt() -> PrivacySalt {
    PrivacySalt::new(vec![0x01; 32]).unwrap()
}

fn abc_transaction() -> WireTransaction {
    let groups = vec![
        vec![TransactionMetadata::default().to_bytes().unwrap()],
        vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()],
    ];
    WireTransaction::new(groups, salt(), &DigestSettings::default()).unwrap()
}

fn full_transaction() -> WireTransaction {
    let groups = vec![
        vec![TransactionMetadata::default().to_bytes().unwrap()],
        vec![b"notary".to_vec(), b"notary-key".to_vec(), b"window".to_vec()],
        vec![b"alice".to_vec(), b"bob".to_vec(), b"carol".to_vec()],
        vec![b"cash".to_vec(), b"bond".to_vec()],
        vec![b"issue".to_vec()],
        vec![b"-".to_vec()],
        vec![b"in-0".to_vec(), b"in-1".to_vec()],
        vec![b"ref-0".to_vec()],
        vec![b"100".to_vec(), b"200".to_vec()],
        vec![b"move".to_vec(), b"exit".to_vec()],
    ];
    WireTransaction::new(groups, salt(), &DigestSettings::default()).unwrap()
}

/// Three outputs against two info entries
fn unbalanced_transaction() -> WireTransaction {
    let mut groups = full_transaction().component_groups().to_vec();
    groups[ComponentGroup::Outputs.index()].push(b"300".to_vec());
    WireTransaction::new(groups, salt(), &DigestSettings::default()).unwrap()
}

/// Swap the proof carried for `group` through the serialized form
fn replace_group_proof(
    ftx: &FilteredTransaction,
    group: usize,
    proof: &MerkleProof,
) -> FilteredTransaction {
    let mut json: serde_json::Value = serde_json::to_value(ftx).unwrap();
    json["filtered_component_groups"][group.to_string()] = serde_json::to_value(proof).unwrap();
    serde_json::from_value(json).unwrap()
}

fn reveal_everything(tx: &WireTransaction) -> FilteredTransaction {
    (1..tx.component_group_count())
        .fold(FilteredTransactionBuilder::new(tx), |builder, index| {
            builder.with_group(index, Disclosure::All)
        })
        .build()
        .unwrap()
}

#[test]
fn fully_revealed_view_recomputes_id() {
    init_logger();
    let tx = full_transaction();
    let ftx = reveal_everything(&tx);
    ftx.verify().unwrap();

    let root = ftx
        .top_level_merkle_proof()
        .calculate_root(&tx.digest_settings().root_provider())
        .unwrap();
    assert_eq!(&root, tx.id());
    assert_eq!(ftx.id(), tx.id());

    for (index, group) in tx.component_groups().iter().enumerate() {
        let revealed = ftx.filtered_data(index);
        assert_eq!(revealed.size(), Some(group.len()));
        let values: Vec<_> = revealed.values().unwrap().values().cloned().collect();
        assert_eq!(&values, group);
    }
}

#[test]
fn size_only_group_still_verifies() {
    let tx = full_transaction();
    let ftx = FilteredTransactionBuilder::new(&tx)
        .with_notary()
        .with_signatories(Disclosure::SizeOnly)
        .with_input_states(Disclosure::All)
        .with_reference_states(Disclosure::All)
        .with_commands(Disclosure::All)
        .build()
        .unwrap();
    ftx.verify().unwrap();
    assert_eq!(
        ftx.filtered_data(ComponentGroup::Signatories.index()),
        FilteredData::SizeOnly { size: 3 }
    );
}

#[test]
fn predicate_matching_nothing_gives_size_proof() {
    let tx = abc_transaction();
    let ftx = FilteredTransactionBuilder::new(&tx)
        .with_group(1, Disclosure::matching(|_: &Vec<u8>| false))
        .build()
        .unwrap();
    ftx.verify().unwrap();

    let proof = ftx.component_group_proof(1).unwrap();
    assert_eq!(proof.proof_type, MerkleProofType::Size);
    assert_eq!(proof.tree_size, 3);
    assert_eq!(ftx.filtered_data(1), FilteredData::SizeOnly { size: 3 });
}

#[test]
fn predicate_matching_everything_gives_full_audit() {
    let tx = abc_transaction();
    let ftx = FilteredTransactionBuilder::new(&tx)
        .with_group(1, Disclosure::matching(|_: &Vec<u8>| true))
        .build()
        .unwrap();
    ftx.verify().unwrap();

    let proof = ftx.component_group_proof(1).unwrap();
    assert_eq!(proof.proof_type, MerkleProofType::Audit);
    assert_eq!(proof.leaves.len(), 3);
}

#[test]
fn complementary_predicates_share_id() {
    let tx = abc_transaction();
    let left = FilteredTransactionBuilder::new(&tx)
        .with_group(1, Disclosure::matching(|c: &Vec<u8>| c == b"b"))
        .build()
        .unwrap();
    let right = FilteredTransactionBuilder::new(&tx)
        .with_group(1, Disclosure::matching(|c: &Vec<u8>| c != b"b"))
        .build()
        .unwrap();

    left.verify().unwrap();
    right.verify().unwrap();
    assert_eq!(left.id(), right.id());
    assert_eq!(left.id(), tx.id());

    let left_keys: Vec<_> = left.filtered_data(1).values().unwrap().keys().copied().collect();
    let right_keys: Vec<_> = right.filtered_data(1).values().unwrap().keys().copied().collect();
    assert_eq!(left_keys, vec![1]);
    assert_eq!(right_keys, vec![0, 2]);
}

#[test]
fn omitted_groups_are_removed() {
    let tx = full_transaction();
    let ftx = FilteredTransactionBuilder::new(&tx)
        .with_input_states(Disclosure::Omit)
        .with_commands(Disclosure::matching(|c: &Vec<u8>| c == b"exit"))
        .build()
        .unwrap();
    ftx.verify().unwrap();

    assert!(ftx.filtered_data(ComponentGroup::Inputs.index()).is_removed());
    assert!(ftx.filtered_data(ComponentGroup::Signatories.index()).is_removed());
    assert_eq!(ftx.filtered_component_groups().len(), 2);
}

#[test]
fn metadata_is_always_revealed() {
    let tx = full_transaction();
    let ftx = FilteredTransactionBuilder::new(&tx)
        .with_group(0, Disclosure::Omit)
        .build()
        .unwrap();
    ftx.verify().unwrap();
    assert_eq!(&ftx.metadata().unwrap(), tx.metadata());
}

#[test]
fn duplicate_directive_rejected() {
    let tx = full_transaction();
    let result = FilteredTransactionBuilder::new(&tx)
        .with_signatories(Disclosure::All)
        .with_group(2, Disclosure::SizeOnly)
        .build();
    assert!(matches!(result, Err(FilterError::DuplicateDirective { group: 2 })));

    let result = FilteredTransactionBuilder::new(&tx)
        .with_notary()
        .with_group(1, Disclosure::All)
        .build();
    assert!(matches!(result, Err(FilterError::DuplicateDirective { group: 1 })));
}

#[test]
fn directive_for_missing_group_is_ignored() {
    let tx = abc_transaction();
    let ftx = FilteredTransactionBuilder::new(&tx)
        .with_commands(Disclosure::All)
        .build()
        .unwrap();
    ftx.verify().unwrap();
    assert!(ftx.filtered_data(ComponentGroup::Commands.index()).is_removed());
}

#[test]
fn output_states_follow_predicate_into_info() {
    let tx = full_transaction();
    let ftx = FilteredTransactionBuilder::new(&tx)
        .with_output_states(Disclosure::matching(|s: &Vec<u8>| s == b"100"))
        .build()
        .unwrap();
    ftx.verify().unwrap();

    let info = ftx.filtered_data(ComponentGroup::OutputsInfo.index());
    assert_eq!(info.values().unwrap().keys().copied().collect::<Vec<_>>(), vec![0]);

    let outputs = ftx.output_states().unwrap();
    assert_eq!(
        outputs.values().unwrap()[&0],
        (b"100".to_vec(), b"cash".to_vec())
    );
}

#[test]
fn output_states_without_info_rejected() {
    let tx = full_transaction();
    let ftx = FilteredTransactionBuilder::new(&tx)
        .with_group(ComponentGroup::Outputs.index(), Disclosure::All)
        .build()
        .unwrap();
    assert!(matches!(
        ftx.verify(),
        Err(FilteredTransactionError::FilteredDataInconsistency { .. })
    ));
}

#[test]
fn swapped_group_proof_rejected() {
    let tx = full_transaction();
    let ftx = FilteredTransactionBuilder::new(&tx)
        .with_input_states(Disclosure::All)
        .with_reference_states(Disclosure::All)
        .build()
        .unwrap();

    let mut json: serde_json::Value = serde_json::to_value(&ftx).unwrap();
    let groups = json["filtered_component_groups"].as_object_mut().unwrap();
    let inputs = groups["6"].clone();
    groups.insert("7".into(), inputs);
    let forged: FilteredTransaction = serde_json::from_value(json).unwrap();

    assert!(matches!(
        forged.verify(),
        Err(FilteredTransactionError::InconsistentFilteredData { .. })
    ));
}

#[test]
fn serialized_view_still_verifies() {
    let tx = full_transaction();
    let ftx = FilteredTransactionBuilder::new(&tx)
        .with_notary()
        .with_time_window()
        .with_output_states(Disclosure::All)
        .build()
        .unwrap();

    let encoded = serde_json::to_vec(&ftx).unwrap();
    let decoded: FilteredTransaction = serde_json::from_slice(&encoded).unwrap();
    assert_eq!(decoded, ftx);
    decoded.verify().unwrap();
    assert_eq!(decoded.time_window(), Some(&b"window"[..]));
}

#[test]
fn interior_hashes_cannot_shrink_a_size_only_group() {
    init_logger();
    let tx = full_transaction();
    let signatories = ComponentGroup::Signatories.index();
    let ftx = FilteredTransactionBuilder::new(&tx)
        .with_signatories(Disclosure::SizeOnly)
        .build()
        .unwrap();
    ftx.verify().unwrap();

    // [h0, h1, h2] and [node(h0, h1), h2] fold to the same root
    let mut forged = ftx.component_group_proof(signatories).unwrap().clone();
    let verifier = tx.digest_settings().component_verifier();
    let paired = verifier.node_hash(&forged.hashes[0], &forged.hashes[1]);
    forged.hashes = vec![paired, forged.hashes[2].clone()];
    forged.tree_size = 2;
    let root = tx.component_merkle_roots()[signatories].clone();
    assert!(forged.verify(&root, &verifier));

    let forged = replace_group_proof(&ftx, signatories, &forged);
    assert!(matches!(
        forged.verify(),
        Err(FilteredTransactionError::InconsistentFilteredData { .. })
    ));
}

#[test]
fn audit_proof_cannot_claim_another_size() {
    let tx = full_transaction();
    let signatories = ComponentGroup::Signatories.index();
    let ftx = FilteredTransactionBuilder::new(&tx)
        .with_signatories(Disclosure::matching(|s: &Vec<u8>| s == b"alice"))
        .build()
        .unwrap();
    ftx.verify().unwrap();

    // leaf 0 of three climbs the same path as leaf 0 of four
    let mut forged = ftx.component_group_proof(signatories).unwrap().clone();
    forged.tree_size = 4;
    let verifier = tx.digest_settings().component_verifier();
    let root = tx.component_merkle_roots()[signatories].clone();
    assert!(forged.verify(&root, &verifier));

    let forged = replace_group_proof(&ftx, signatories, &forged);
    assert!(matches!(
        forged.verify(),
        Err(FilteredTransactionError::InconsistentFilteredData { .. })
    ));
}

#[test]
fn top_level_proof_cannot_claim_another_group_count() {
    let tx = full_transaction();
    let ftx = FilteredTransactionBuilder::new(&tx).with_notary().build().unwrap();

    let mut json: serde_json::Value = serde_json::to_value(&ftx).unwrap();
    json["top_level_merkle_proof"]["tree_size"] = serde_json::json!(11);
    let forged: FilteredTransaction = serde_json::from_value(json).unwrap();
    assert!(matches!(
        forged.verify(),
        Err(FilteredTransactionError::InconsistentFilteredData { .. })
    ));
}

#[test]
fn size_only_outputs_and_info_must_agree_on_count() {
    let tx = unbalanced_transaction();
    let ftx = FilteredTransactionBuilder::new(&tx)
        .with_output_states(Disclosure::SizeOnly)
        .build()
        .unwrap();
    assert!(matches!(
        ftx.verify(),
        Err(FilteredTransactionError::FilteredDataInconsistency {
            group: 8,
            paired_group: 3,
            ..
        })
    ));
}

#[test]
fn revealed_outputs_and_info_must_agree_on_count() {
    let tx = unbalanced_transaction();
    let ftx = FilteredTransactionBuilder::new(&tx)
        .with_output_states(Disclosure::matching(|s: &Vec<u8>| s == b"100"))
        .build()
        .unwrap();
    assert!(matches!(
        ftx.verify(),
        Err(FilteredTransactionError::FilteredDataInconsistency { .. })
    ));
    assert!(ftx.output_states().is_err());
}
