use meridian_crypto::{
    DigestAlgorithm, DigestService, MerkleError, MerkleProofType, MerkleTree,
    MerkleTreeHashDigestProvider, NonceHashDigestProvider, TweakableHashDigestProvider,
};

fn entropy(seed: &[u8]) -> meridian_crypto::SecureHash {
    DigestService::new().hash(seed, DigestAlgorithm::Sha256D)
}

fn components() -> Vec<Vec<u8>> {
    vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]
}

#[test]
fn nonce_proof_checks_without_entropy() {
    let provider = NonceHashDigestProvider::new(DigestAlgorithm::Sha256D, entropy(b"group-1"));
    let tree = MerkleTree::build(components(), provider).unwrap();

    let proof = tree.create_audit_proof(&[1]).unwrap();
    assert!(proof.leaves[0].nonce.is_some());

    let verifier = NonceHashDigestProvider::verifier(DigestAlgorithm::Sha256D);
    assert!(proof.verify(tree.root(), &verifier));
}

#[test]
fn size_proof_hides_content() {
    let provider = NonceHashDigestProvider::new(DigestAlgorithm::Sha256D, entropy(b"group-1"));
    let tree = MerkleTree::build(components(), provider).unwrap();

    let proof = tree.create_size_proof().unwrap();
    assert_eq!(proof.proof_type, MerkleProofType::Size);
    assert_eq!(proof.tree_size, 3);
    assert!(proof.leaves.is_empty());
    assert_eq!(proof.hashes, tree.leaf_hashes());

    let verifier = NonceHashDigestProvider::verifier(DigestAlgorithm::Sha256D);
    assert!(proof.verify(tree.root(), &verifier));
}

#[test]
fn different_entropy_different_root() {
    let a = MerkleTree::build(
        components(),
        NonceHashDigestProvider::new(DigestAlgorithm::Sha256D, entropy(b"one")),
    )
    .unwrap();
    let b = MerkleTree::build(
        components(),
        NonceHashDigestProvider::new(DigestAlgorithm::Sha256D, entropy(b"two")),
    )
    .unwrap();
    assert_ne!(a.root(), b.root());
}

#[test]
fn tweakable_tree_refuses_size_proof() {
    let provider =
        TweakableHashDigestProvider::new(DigestAlgorithm::Sha256, b"LEAF".to_vec(), b"NODE".to_vec());
    let tree = MerkleTree::build(components(), provider).unwrap();
    assert!(matches!(
        tree.create_size_proof(),
        Err(MerkleError::UnsupportedProofKind { .. })
    ));
}

#[test]
fn proof_from_one_tree_fails_on_another() {
    let provider =
        TweakableHashDigestProvider::new(DigestAlgorithm::Blake3, b"LEAF".to_vec(), b"NODE".to_vec());
    let first = MerkleTree::build(components(), provider.clone()).unwrap();
    let second = MerkleTree::build(vec![b"x".to_vec(), b"y".to_vec()], provider.clone()).unwrap();

    let proof = first.create_audit_proof(&[0]).unwrap();
    assert!(proof.verify(first.root(), &provider));
    assert!(!proof.verify(second.root(), &provider));
}

#[test]
fn empty_inputs_rejected() {
    let provider =
        TweakableHashDigestProvider::new(DigestAlgorithm::Sha512, b"LEAF".to_vec(), b"NODE".to_vec());
    assert!(matches!(
        MerkleTree::build(Vec::new(), provider.clone()),
        Err(MerkleError::EmptyTree)
    ));

    let tree = MerkleTree::build(components(), provider).unwrap();
    assert!(matches!(
        tree.create_audit_proof(&[]),
        Err(MerkleError::EmptyIndices)
    ));
    assert!(matches!(
        tree.create_audit_proof(&[3]),
        Err(MerkleError::IndexOutOfRange { index: 3, size: 3 })
    ));
}

#[test]
fn interior_hashes_posing_as_leaves_fail_sized_check() {
    let leaves = vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec(), b"d".to_vec()];
    let provider = NonceHashDigestProvider::new(DigestAlgorithm::Sha256D, entropy(b"group-1"));
    let tree = MerkleTree::build(leaves, provider).unwrap();
    let hashes = tree.leaf_hashes();

    let mut forged = tree.create_size_proof().unwrap();
    forged.tree_size = 2;
    forged.hashes = vec![
        tree.provider().node_hash(&hashes[0], &hashes[1]),
        tree.provider().node_hash(&hashes[2], &hashes[3]),
    ];

    let verifier = NonceHashDigestProvider::verifier(DigestAlgorithm::Sha256D);
    // the bare root cannot tell the two shapes apart
    assert!(forged.verify(tree.root(), &verifier));
    assert!(!forged.verify_sized(tree.root(), tree.size(), &verifier));
}

#[test]
fn claimed_audit_size_must_match() {
    let leaves = vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec(), b"d".to_vec()];
    let provider = NonceHashDigestProvider::new(DigestAlgorithm::Sha256D, entropy(b"group-2"));
    let tree = MerkleTree::build(leaves, provider).unwrap();
    let verifier = NonceHashDigestProvider::verifier(DigestAlgorithm::Sha256D);

    let proof = tree.create_audit_proof(&[0]).unwrap();
    assert!(proof.verify_sized(tree.root(), 4, &verifier));

    let mut forged = proof;
    forged.tree_size = 3;
    assert!(forged.verify(tree.root(), &verifier));
    assert!(!forged.verify_sized(tree.root(), 4, &verifier));
}
