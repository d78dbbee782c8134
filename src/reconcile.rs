//! Reconciliation of many-to-many memberships.
//!
//! A membership maps the name of a related entity to the attributes carried
//! by the edge that links it to its owner (`()` for plain edges). Moving an
//! owner from one membership to another is split in two steps: [`Plan::between`]
//! is a pure set difference, and [`apply`] walks the plan against a
//! [`Relation`], which knows how to find, create, link and unlink targets in
//! storage.
//!
//! Nothing here opens a transaction. Callers run [`reconcile`] inside one so
//! that an error from any single edge operation rolls back the whole batch.

use std::collections::BTreeMap;

use log::{debug, info};

use crate::error::ServiceError;

pub(crate) type Membership<A> = BTreeMap<String, A>;

/// Builds an attribute-less membership from a list of names. Duplicates
/// collapse and surrounding whitespace is ignored; blank names are dropped.
pub(crate) fn names<I, S>(names: I) -> Membership<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|n| n.as_ref().trim().to_string())
        .filter(|n| !n.is_empty())
        .map(|n| (n, ()))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Plan<A> {
    pub to_add: Vec<(String, A)>,
    pub to_update: Vec<(String, A)>,
    pub to_remove: Vec<String>,
}

impl<A: Clone + PartialEq> Plan<A> {
    pub(crate) fn between(before: &Membership<A>, after: &Membership<A>) -> Self {
        let mut to_add = Vec::new();
        let mut to_update = Vec::new();

        for (name, attrs) in after {
            match before.get(name) {
                None => to_add.push((name.clone(), attrs.clone())),
                Some(prev) if prev != attrs => to_update.push((name.clone(), attrs.clone())),
                Some(_) => {}
            }
        }

        let to_remove = before
            .keys()
            .filter(|name| !after.contains_key(*name))
            .cloned()
            .collect();

        Plan {
            to_add,
            to_update,
            to_remove,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_update.is_empty() && self.to_remove.is_empty()
    }
}

/// Outcome of resolving a name against storage.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Resolved<T> {
    Found(T),
    Created(T),
}

impl<T> Resolved<T> {
    pub(crate) fn was_created(&self) -> bool {
        matches!(self, Resolved::Created(_))
    }

    pub(crate) fn into_inner(self) -> T {
        match self {
            Resolved::Found(t) | Resolved::Created(t) => t,
        }
    }
}

/// What a single reconciliation pass did, by name.
#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct Reconciliation {
    pub added: Vec<String>,
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub removed: Vec<String>,
    pub skipped: Vec<String>,
}

impl Reconciliation {
    pub(crate) fn is_noop(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// An entity that holds an in-memory copy of its related members.
pub(crate) trait Owner {
    type Member;

    fn owner_id(&self) -> i32;
    fn members(&self) -> &[Self::Member];
    fn members_mut(&mut self) -> &mut Vec<Self::Member>;
}

/// Storage side of one join table.
pub(crate) trait Relation {
    type Owner: Owner;
    type Target;
    type Attrs: Clone + PartialEq;

    /// Used in error messages, e.g. "dish".
    const KIND: &'static str;

    fn find(&mut self, name: &str) -> Result<Option<Self::Target>, ServiceError>;

    /// Creates a target from its name alone. `None` means this relation
    /// does not create missing targets.
    fn create(&mut self, _name: &str) -> Result<Option<Self::Target>, ServiceError> {
        Ok(None)
    }

    fn link(
        &mut self,
        owner_id: i32,
        target: &Self::Target,
        attrs: &Self::Attrs,
    ) -> Result<usize, ServiceError>;

    /// Rewrites the attributes of an existing edge. Relations whose edges
    /// carry no attributes never get here.
    fn relink(
        &mut self,
        _owner_id: i32,
        _target: &Self::Target,
        _attrs: &Self::Attrs,
    ) -> Result<usize, ServiceError> {
        Ok(0)
    }

    fn unlink(&mut self, owner_id: i32, target: &Self::Target) -> Result<usize, ServiceError>;

    fn member(target: Self::Target, attrs: Self::Attrs) -> <Self::Owner as Owner>::Member;
    fn member_name(member: &<Self::Owner as Owner>::Member) -> &str;
    fn member_attrs(member: &<Self::Owner as Owner>::Member) -> Self::Attrs;

    /// Current membership as held in memory by the owner.
    fn membership(owner: &Self::Owner) -> Membership<Self::Attrs> {
        owner
            .members()
            .iter()
            .map(|m| (Self::member_name(m).to_string(), Self::member_attrs(m)))
            .collect()
    }
}

pub(crate) fn resolve<R: Relation>(
    relation: &mut R,
    name: &str,
) -> Result<Resolved<R::Target>, ServiceError> {
    if let Some(found) = relation.find(name)? {
        return Ok(Resolved::Found(found));
    }
    match relation.create(name)? {
        Some(created) => {
            info!("created {} `{}` while linking", R::KIND, name);
            Ok(Resolved::Created(created))
        }
        None => Err(ServiceError::UnknownMember {
            kind: R::KIND,
            name: name.to_string(),
        }),
    }
}

/// Moves `owner` from `before` to `after`, issuing only the edge
/// operations the difference calls for.
pub(crate) fn reconcile<R: Relation>(
    relation: &mut R,
    owner: &mut R::Owner,
    before: &Membership<R::Attrs>,
    after: &Membership<R::Attrs>,
) -> Result<Reconciliation, ServiceError> {
    apply(relation, owner, Plan::between(before, after))
}

pub(crate) fn apply<R: Relation>(
    relation: &mut R,
    owner: &mut R::Owner,
    plan: Plan<R::Attrs>,
) -> Result<Reconciliation, ServiceError> {
    let mut report = Reconciliation::default();
    if plan.is_empty() {
        return Ok(report);
    }
    let owner_id = owner.owner_id();

    // Removes go first: storage may match names loosely, so an added
    // spelling can resolve to the very target a removed one points at.
    for name in plan.to_remove {
        let target = match relation.find(&name)? {
            Some(target) => target,
            None => {
                debug!("{} `{}` no longer exists, nothing to unlink", R::KIND, name);
                report.skipped.push(name);
                continue;
            }
        };
        if relation.unlink(owner_id, &target)? == 0 {
            report.skipped.push(name);
            continue;
        }
        owner.members_mut().retain(|m| R::member_name(m) != name);
        report.removed.push(name);
    }

    for (name, attrs) in plan.to_update {
        let target = match relation.find(&name)? {
            Some(target) => target,
            None => {
                debug!("{} `{}` vanished before its edge could be updated", R::KIND, name);
                report.skipped.push(name);
                continue;
            }
        };
        if relation.relink(owner_id, &target, &attrs)? == 0 {
            report.skipped.push(name);
            continue;
        }
        let members = owner.members_mut();
        members.retain(|m| R::member_name(m) != name);
        members.push(R::member(target, attrs));
        report.updated.push(name);
    }

    for (name, attrs) in plan.to_add {
        let resolved = resolve(relation, &name)?;
        if resolved.was_created() {
            report.created.push(name.clone());
        }
        let target = resolved.into_inner();
        if relation.link(owner_id, &target, &attrs)? == 0 {
            debug!("{} `{}` was already linked to {}", R::KIND, name, owner_id);
            report.skipped.push(name);
            continue;
        }
        owner.members_mut().push(R::member(target, attrs));
        report.added.push(name);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Find(String),
        Create(String),
        Link(String),
        Relink(String),
        Unlink(String),
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Item<A> {
        id: i32,
        name: String,
        attrs: A,
    }

    #[derive(Debug)]
    struct Basket<A> {
        id: i32,
        items: Vec<Item<A>>,
    }

    impl<A> Owner for Basket<A> {
        type Member = Item<A>;

        fn owner_id(&self) -> i32 {
            self.id
        }

        fn members(&self) -> &[Item<A>] {
            &self.items
        }

        fn members_mut(&mut self) -> &mut Vec<Item<A>> {
            &mut self.items
        }
    }

    /// In-memory join table that records every call made against it.
    struct Fake<A> {
        creates: bool,
        next_id: i32,
        targets: BTreeMap<String, i32>,
        edges: BTreeMap<(i32, i32), A>,
        fail_link: Option<String>,
        fold_case: bool,
        ops: Vec<Op>,
    }

    impl<A: Clone + PartialEq> Fake<A> {
        fn new(creates: bool) -> Self {
            Fake {
                creates,
                next_id: 1,
                targets: BTreeMap::new(),
                edges: BTreeMap::new(),
                fail_link: None,
                fold_case: false,
                ops: Vec::new(),
            }
        }

        fn add_target(&mut self, name: &str) -> i32 {
            if let Some(id) = self.targets.get(name) {
                return *id;
            }
            let id = self.next_id;
            self.next_id += 1;
            self.targets.insert(name.to_string(), id);
            id
        }

        fn seed(&mut self, owner_id: i32, membership: &Membership<A>) -> Basket<A> {
            let mut items = Vec::new();
            for (name, attrs) in membership {
                let id = self.add_target(name);
                self.edges.insert((owner_id, id), attrs.clone());
                items.push(Item {
                    id,
                    name: name.clone(),
                    attrs: attrs.clone(),
                });
            }
            Basket {
                id: owner_id,
                items,
            }
        }

        fn linked(&self, owner_id: i32) -> Membership<A> {
            self.targets
                .iter()
                .filter_map(|(name, id)| {
                    self.edges
                        .get(&(owner_id, *id))
                        .map(|attrs| (name.clone(), attrs.clone()))
                })
                .collect()
        }

        fn writes(&self) -> Vec<Op> {
            self.ops
                .iter()
                .filter(|op| !matches!(op, Op::Find(_)))
                .cloned()
                .collect()
        }

        fn name_of(&self, id: i32) -> String {
            self.targets
                .iter()
                .find(|(_, v)| **v == id)
                .map(|(k, _)| k.clone())
                .unwrap()
        }
    }

    impl<A: Clone + PartialEq> Relation for Fake<A> {
        type Owner = Basket<A>;
        type Target = (i32, String);
        type Attrs = A;

        const KIND: &'static str = "item";

        fn find(&mut self, name: &str) -> Result<Option<(i32, String)>, ServiceError> {
            self.ops.push(Op::Find(name.to_string()));
            if self.fold_case {
                // like a case-insensitive collation: the stored spelling wins
                return Ok(self
                    .targets
                    .iter()
                    .find(|(stored, _)| stored.to_lowercase() == name.to_lowercase())
                    .map(|(stored, id)| (*id, stored.clone())));
            }
            Ok(self.targets.get(name).map(|id| (*id, name.to_string())))
        }

        fn create(&mut self, name: &str) -> Result<Option<(i32, String)>, ServiceError> {
            if !self.creates {
                return Ok(None);
            }
            self.ops.push(Op::Create(name.to_string()));
            let id = self.add_target(name);
            Ok(Some((id, name.to_string())))
        }

        fn link(
            &mut self,
            owner_id: i32,
            target: &(i32, String),
            attrs: &A,
        ) -> Result<usize, ServiceError> {
            self.ops.push(Op::Link(target.1.clone()));
            if self.fail_link.as_deref() == Some(target.1.as_str()) {
                return Err(ServiceError::Database(
                    diesel::result::Error::RollbackTransaction,
                ));
            }
            if self.edges.contains_key(&(owner_id, target.0)) {
                return Ok(0);
            }
            self.edges.insert((owner_id, target.0), attrs.clone());
            Ok(1)
        }

        fn relink(
            &mut self,
            owner_id: i32,
            target: &(i32, String),
            attrs: &A,
        ) -> Result<usize, ServiceError> {
            self.ops.push(Op::Relink(target.1.clone()));
            match self.edges.get_mut(&(owner_id, target.0)) {
                Some(existing) => {
                    *existing = attrs.clone();
                    Ok(1)
                }
                None => Ok(0),
            }
        }

        fn unlink(&mut self, owner_id: i32, target: &(i32, String)) -> Result<usize, ServiceError> {
            self.ops.push(Op::Unlink(target.1.clone()));
            Ok(self.edges.remove(&(owner_id, target.0)).map_or(0, |_| 1))
        }

        fn member(target: (i32, String), attrs: A) -> Item<A> {
            Item {
                id: target.0,
                name: target.1,
                attrs,
            }
        }

        fn member_name(member: &Item<A>) -> &str {
            &member.name
        }

        fn member_attrs(member: &Item<A>) -> A {
            member.attrs.clone()
        }
    }

    fn set(items: &[&str]) -> Membership<()> {
        names(items.iter().copied())
    }

    #[test]
    fn swaps_lettuce_for_onion_and_leaves_tomato() {
        let mut fake = Fake::new(true);
        let before = set(&["Lettuce", "Tomato"]);
        let mut basket = fake.seed(7, &before);
        let after = set(&["Tomato", "Onion"]);

        let report = reconcile(&mut fake, &mut basket, &before, &after).unwrap();

        assert_eq!(report.added, vec!["Onion"]);
        assert_eq!(report.created, vec!["Onion"]);
        assert_eq!(report.removed, vec!["Lettuce"]);
        assert!(report.skipped.is_empty());
        assert_eq!(
            fake.writes(),
            vec![
                Op::Unlink("Lettuce".into()),
                Op::Create("Onion".into()),
                Op::Link("Onion".into()),
            ]
        );
        assert!(!fake.ops.contains(&Op::Find("Tomato".into())));
        assert_eq!(fake.linked(7), after);
        assert_eq!(Fake::membership(&basket), after);
    }

    #[test]
    fn equal_memberships_issue_no_operations() {
        let mut fake = Fake::new(true);
        let members = set(&["Salt", "Pepper"]);
        let mut basket = fake.seed(1, &members);

        let report = reconcile(&mut fake, &mut basket, &members, &members).unwrap();

        assert!(report.is_noop());
        assert!(fake.ops.is_empty());
    }

    #[test]
    fn second_pass_to_the_same_target_is_a_noop() {
        let mut fake = Fake::new(true);
        let before = set(&["Bun"]);
        let mut basket = fake.seed(3, &before);
        let after = set(&["Bun", "Cheese", "Pickles"]);

        reconcile(&mut fake, &mut basket, &before, &after).unwrap();
        fake.ops.clear();

        let now = Fake::membership(&basket);
        let report = reconcile(&mut fake, &mut basket, &now, &after).unwrap();

        assert!(report.is_noop());
        assert!(fake.ops.is_empty());
    }

    #[test]
    fn unknown_name_is_created_exactly_once_before_its_edge() {
        let mut fake = Fake::new(true);
        let mut basket = fake.seed(2, &Membership::new());

        reconcile(&mut fake, &mut basket, &Membership::new(), &set(&["Paprika"])).unwrap();

        assert_eq!(
            fake.writes(),
            vec![Op::Create("Paprika".into()), Op::Link("Paprika".into())]
        );
    }

    #[test]
    fn existing_target_is_found_not_created() {
        let mut fake = Fake::new(true);
        fake.add_target("Milk");
        let mut basket = fake.seed(2, &Membership::new());

        let report =
            reconcile(&mut fake, &mut basket, &Membership::new(), &set(&["Milk"])).unwrap();

        assert!(report.created.is_empty());
        assert_eq!(fake.writes(), vec![Op::Link("Milk".into())]);
        assert_eq!(basket.items[0].name, "Milk");
    }

    #[test]
    fn removing_a_name_the_store_never_knew_is_skipped() {
        let mut fake: Fake<()> = Fake::new(true);
        let mut basket = Basket { id: 4, items: vec![] };
        let before = set(&["Ghost"]);

        let report = reconcile(&mut fake, &mut basket, &before, &Membership::new()).unwrap();

        assert_eq!(report.skipped, vec!["Ghost"]);
        assert!(report.removed.is_empty());
        assert!(fake.writes().is_empty());
    }

    #[test]
    fn removing_an_edge_that_is_already_gone_is_skipped() {
        let mut fake: Fake<()> = Fake::new(true);
        fake.add_target("Sugar");
        let mut basket = Basket { id: 4, items: vec![] };

        let report =
            reconcile(&mut fake, &mut basket, &set(&["Sugar"]), &Membership::new()).unwrap();

        assert_eq!(report.skipped, vec!["Sugar"]);
        assert_eq!(fake.writes(), vec![Op::Unlink("Sugar".into())]);
    }

    #[test]
    fn relation_without_create_rejects_unknown_names() {
        let mut fake: Fake<()> = Fake::new(false);
        fake.add_target("Fries");
        let mut basket = fake.seed(9, &Membership::new());

        let err = reconcile(
            &mut fake,
            &mut basket,
            &Membership::new(),
            &set(&["Fries", "Soft Drink"]),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::UnknownMember { kind: "item", ref name } if name == "Soft Drink"
        ));
    }

    #[test]
    fn failing_edge_surfaces_the_error() {
        let mut fake = Fake::new(true);
        fake.fail_link = Some("Bacon".into());
        let mut basket = fake.seed(5, &Membership::new());

        let err = reconcile(
            &mut fake,
            &mut basket,
            &Membership::new(),
            &set(&["Bacon", "Cheese"]),
        )
        .unwrap_err();

        assert!(err.is_infrastructure());
    }

    #[test]
    fn changed_edge_attributes_are_rewritten_in_place() {
        let mut fake = Fake::new(true);
        let before: Membership<(u32, &str)> = vec![
            ("Milk".to_string(), (500, "ml")),
            ("Sugar".to_string(), (50, "gram")),
        ]
        .into_iter()
        .collect();
        let mut basket = fake.seed(11, &before);
        let mut after = before.clone();
        after.insert("Milk".to_string(), (300, "ml"));

        let report = reconcile(&mut fake, &mut basket, &before, &after).unwrap();

        assert_eq!(report.updated, vec!["Milk"]);
        assert!(report.added.is_empty() && report.removed.is_empty());
        assert_eq!(fake.writes(), vec![Op::Relink("Milk".into())]);
        assert_eq!(fake.linked(11), after);
        assert_eq!(Fake::membership(&basket), after);
    }

    #[test]
    fn respelled_name_keeps_its_edge() {
        let mut fake = Fake::new(true);
        fake.fold_case = true;
        let before = set(&["Tomato"]);
        let mut basket = fake.seed(7, &before);
        let tomato = basket.items[0].id;

        let report = reconcile(&mut fake, &mut basket, &before, &set(&["tomato"])).unwrap();

        assert!(fake.edges.contains_key(&(7, tomato)));
        assert_eq!(report.removed, vec!["Tomato"]);
        assert_eq!(report.added, vec!["tomato"]);
        assert!(report.created.is_empty());
        assert!(report.skipped.is_empty());
        assert_eq!(basket.items.len(), 1);
        assert_eq!(basket.items[0].id, tomato);
        assert_eq!(
            fake.writes(),
            vec![Op::Unlink("Tomato".into()), Op::Link("Tomato".into())]
        );
    }

    #[test]
    fn every_pair_of_subsets_converges_to_the_target() {
        let universe = ["Beef", "Cheese", "Lettuce", "Tomato"];
        let subset = |mask: u8| -> Membership<()> {
            names(
                universe
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| mask & (1 << i) != 0)
                    .map(|(_, n)| *n),
            )
        };

        for from in 0..16u8 {
            for to in 0..16u8 {
                let mut fake = Fake::new(true);
                let before = subset(from);
                let after = subset(to);
                let mut basket = fake.seed(1, &before);

                let report = reconcile(&mut fake, &mut basket, &before, &after).unwrap();

                assert_eq!(fake.linked(1), after, "{:04b} -> {:04b}", from, to);
                assert_eq!(Fake::membership(&basket), after);
                assert_eq!(
                    report.added.len() + report.removed.len(),
                    (from ^ to).count_ones() as usize
                );
                for (owner, target) in fake.edges.keys() {
                    assert_eq!(*owner, 1);
                    assert!(after.contains_key(&fake.name_of(*target)));
                }
            }
        }
    }

    #[test]
    fn names_trims_and_deduplicates() {
        let membership = names(vec![" Salt", "Salt", "", "Pepper "]);
        assert_eq!(
            membership.keys().cloned().collect::<Vec<_>>(),
            vec!["Pepper", "Salt"]
        );
    }

    #[test]
    fn plan_is_a_plain_set_difference() {
        let plan = Plan::between(&set(&["A", "B"]), &set(&["B", "C"]));
        assert_eq!(plan.to_add, vec![("C".to_string(), ())]);
        assert_eq!(plan.to_remove, vec!["A".to_string()]);
        assert!(plan.to_update.is_empty());
        assert!(Plan::between(&set(&["A"]), &set(&["A"])).is_empty());
    }
}
