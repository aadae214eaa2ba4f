use std::collections::BTreeMap;

use meridian_crypto::MerkleProof;

use crate::error::{FilterError, TransactionError};
use crate::filtered::FilteredTransaction;
use crate::filtered::data::{ComponentDeserializer, RawComponents};
use crate::group::{ComponentGroup, notary};
use crate::wire::WireTransaction;

static RAW_COMPONENTS: RawComponents = RawComponents;

/// How much of one component group to disclose
pub enum Disclosure<'a, C> {
    /// Every component, as an audit proof
    All,
    /// Components the predicate accepts; size-only when none match
    Matching(Box<dyn Fn(&C) -> bool + 'a>),
    /// The component count only
    SizeOnly,
    /// Nothing
    Omit,
}

impl<'a, C> Disclosure<'a, C> {
    pub fn matching(predicate: impl Fn(&C) -> bool + 'a) -> Self {
        Disclosure::Matching(Box::new(predicate))
    }
}

enum Directive<'a, C> {
    Disclose(Disclosure<'a, C>),
    /// Reveal exactly what the leading group reveals
    Follow(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Selection {
    Audit(Vec<usize>),
    Size,
    Removed,
}

/// Builds a [`FilteredTransaction`] from a wire transaction
///
/// Unmentioned groups are removed. The metadata group is always revealed in
/// full and ignores directives.
pub struct FilteredTransactionBuilder<'a, D: ComponentDeserializer = RawComponents> {
    wire: &'a WireTransaction,
    deserializer: &'a D,
    directives: BTreeMap<usize, Directive<'a, D::Component>>,
    notary: bool,
    time_window: bool,
    duplicate: Option<usize>,
}

impl<'a> FilteredTransactionBuilder<'a, RawComponents> {
    /// Builder whose predicates see raw component bytes
    pub fn new(wire: &'a WireTransaction) -> Self {
        Self::with_deserializer(wire, &RAW_COMPONENTS)
    }
}

impl<'a, D: ComponentDeserializer> FilteredTransactionBuilder<'a, D> {
    pub fn with_deserializer(wire: &'a WireTransaction, deserializer: &'a D) -> Self {
        Self {
            wire,
            deserializer,
            directives: BTreeMap::new(),
            notary: false,
            time_window: false,
            duplicate: None,
        }
    }

    /// Reveal the notary name and key
    pub fn with_notary(mut self) -> Self {
        self.notary = true;
        self
    }

    /// Reveal the time window, if the transaction has one
    pub fn with_time_window(mut self) -> Self {
        self.time_window = true;
        self
    }

    pub fn with_signatories(self, disclosure: Disclosure<'a, D::Component>) -> Self {
        self.with_group(ComponentGroup::Signatories.index(), disclosure)
    }

    pub fn with_input_states(self, disclosure: Disclosure<'a, D::Component>) -> Self {
        self.with_group(ComponentGroup::Inputs.index(), disclosure)
    }

    pub fn with_reference_states(self, disclosure: Disclosure<'a, D::Component>) -> Self {
        self.with_group(ComponentGroup::References.index(), disclosure)
    }

    pub fn with_commands(self, disclosure: Disclosure<'a, D::Component>) -> Self {
        self.with_group(ComponentGroup::Commands.index(), disclosure)
    }

    /// Disclose outputs; their info entries follow at the same indices
    pub fn with_output_states(mut self, disclosure: Disclosure<'a, D::Component>) -> Self {
        let outputs = ComponentGroup::Outputs.index();
        self.insert(outputs, Directive::Disclose(disclosure));
        self.insert(ComponentGroup::OutputsInfo.index(), Directive::Follow(outputs));
        self
    }

    /// Disclose any group by raw index
    pub fn with_group(mut self, index: usize, disclosure: Disclosure<'a, D::Component>) -> Self {
        self.insert(index, Directive::Disclose(disclosure));
        self
    }

    pub fn build(self) -> Result<FilteredTransaction, FilterError> {
        let notary_index = ComponentGroup::Notary.index();
        if (self.notary || self.time_window) && self.directives.contains_key(&notary_index) {
            return Err(FilterError::DuplicateDirective {
                group: notary_index,
            });
        }
        if let Some(group) = self.duplicate {
            return Err(FilterError::DuplicateDirective { group });
        }

        let mut selections = BTreeMap::new();
        selections.insert(ComponentGroup::Metadata.index(), Selection::Audit(vec![0]));

        if let Some(selection) = self.notary_selection() {
            selections.insert(notary_index, selection);
        }

        for (&index, directive) in &self.directives {
            let Directive::Disclose(disclosure) = directive else {
                continue;
            };
            match self.wire.component_groups().get(index) {
                Some(components) => {
                    selections.insert(index, self.select(index, components, disclosure)?);
                }
                None => log::debug!("no component group {index} to disclose"),
            }
        }

        for (&index, directive) in &self.directives {
            let Directive::Follow(leader) = directive else {
                continue;
            };
            if index < self.wire.component_group_count() {
                let selection = selections.get(leader).cloned().unwrap_or(Selection::Removed);
                selections.insert(index, selection);
            }
        }

        let mut proofs: BTreeMap<usize, MerkleProof> = BTreeMap::new();
        for (index, selection) in selections {
            let proof = match selection {
                Selection::Removed => continue,
                Selection::Audit(indices) => self
                    .wire
                    .component_merkle_tree(index)?
                    .create_audit_proof(&indices),
                Selection::Size => self.wire.component_merkle_tree(index)?.create_size_proof(),
            }
            .map_err(|source| FilterError::Proof {
                group: index,
                source,
            })?;
            proofs.insert(index, proof);
        }

        let revealed: Vec<usize> = proofs.keys().copied().collect();
        let top_level_merkle_proof = self
            .wire
            .root_merkle_tree()
            .create_audit_proof(&revealed)
            .map_err(TransactionError::from)?;

        log::debug!(
            "filtered transaction {} discloses groups {revealed:?}",
            self.wire.id()
        );
        Ok(FilteredTransaction::new(
            self.wire.id().clone(),
            top_level_merkle_proof,
            proofs,
        ))
    }

    fn insert(&mut self, index: usize, directive: Directive<'a, D::Component>) {
        if index == ComponentGroup::Metadata.index() {
            log::debug!("metadata is always disclosed, ignoring directive");
            return;
        }
        if self.directives.contains_key(&index) {
            self.duplicate.get_or_insert(index);
            return;
        }
        self.directives.insert(index, directive);
    }

    fn notary_selection(&self) -> Option<Selection> {
        let group = self.wire.group(ComponentGroup::Notary)?;
        let mut indices = Vec::new();
        if self.notary {
            indices.extend([notary::NAME, notary::KEY].into_iter().filter(|i| *i < group.len()));
        }
        if self.time_window && notary::TIME_WINDOW < group.len() {
            indices.push(notary::TIME_WINDOW);
        }
        (!indices.is_empty()).then_some(Selection::Audit(indices))
    }

    fn select(
        &self,
        group: usize,
        components: &[Vec<u8>],
        disclosure: &Disclosure<'a, D::Component>,
    ) -> Result<Selection, FilterError> {
        let selection = match disclosure {
            Disclosure::All => Selection::Audit((0..components.len()).collect()),
            Disclosure::SizeOnly => Selection::Size,
            Disclosure::Omit => Selection::Removed,
            Disclosure::Matching(predicate) => {
                let mut matched = Vec::new();
                for (index, bytes) in components.iter().enumerate() {
                    let component = self.deserializer.deserialize(group, bytes).map_err(|e| {
                        FilterError::Deserialization {
                            group,
                            index,
                            source: Box::new(e),
                        }
                    })?;
                    if predicate(&component) {
                        matched.push(index);
                    }
                }
                // an audit proof revealing nothing would look like a removed group
                if matched.is_empty() {
                    Selection::Size
                } else {
                    Selection::Audit(matched)
                }
            }
        };
        Ok(selection)
    }
}
