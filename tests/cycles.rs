/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Self-referential structs and independent generator runs.

use std::thread;

use syswrap::Config;
use syswrap::Format;
use syswrap::Generator;
use syswrap::PairingTable;
use syswrap::PairingValue;
use syswrap_ctypes::parse;
use syswrap_ctypes::AggregateKind;
use syswrap_tests::generate;
use syswrap_tests::render;

const TREE: &str = "\
#define __NR_walk 500
#define __NR_count 501
struct tree;
struct forest { struct tree *trees; int ntrees; };
struct tree { char *label; struct forest *children; int nchildren; struct tree *parent; };
typedef struct { struct tree *root; } handle_t;
extern int walk (handle_t *h, struct forest *f, int (*visit) (struct tree *));
extern int count (const struct tree *t);
";

fn tree_pairings() -> PairingTable {
    let mut pairings = PairingTable::new();
    pairings.insert("struct forest", "trees", PairingValue::Field("ntrees".into()));
    pairings.insert(
        "struct tree",
        "children",
        PairingValue::Field("nchildren".into()),
    );
    pairings
}

#[test]
fn transitive_cycle() {
    let output = generate(TREE, &tree_pairings(), Format::Macros);
    assert_eq!(
        output,
        "WRAP_STRUCT(handle_t,WRAP_STRUCT_PFIELD(root))\n\
         WRAP_STRUCT(struct tree,WRAP_STRUCT_PFIELD(label);\
         WRAP_STRUCT_ASTRUCT(children,nchildren);WRAP_STRUCT_PFIELD(parent))\n\
         WRAP_STRUCT(struct forest,WRAP_STRUCT_ASTRUCT(trees,ntrees))\n\
         WRAP_SYSCALL(walk,WRAP_SYSCALL_ARG_PSTRUCT(0, handle_t);\
         WRAP_SYSCALL_ARG_PSTRUCT(1, struct forest))\n\
         WRAP_SYSCALL(count,WRAP_SYSCALL_ARG_PSTRUCT(0, struct tree))\n"
    );
}

#[test]
fn direct_cycle() {
    let unit = parse(
        "struct node { struct node *children; unsigned long nchildren; };\n\
         struct empty_node { struct empty_node *children; unsigned long nchildren; };",
    )
    .unwrap();
    let mut pairings = PairingTable::new();
    pairings.insert(
        "struct node",
        "children",
        PairingValue::Field("nchildren".into()),
    );

    let node = unit.types.aggregate(AggregateKind::Struct, "node").unwrap();
    let mut gen = Generator::new(&unit.types, &pairings);
    assert!(gen.needs_wrapper(node).unwrap());
    assert!(gen.needs_wrapper(node).unwrap());
    assert_eq!(
        render(gen.records(), Format::Macros),
        "WRAP_STRUCT(struct node,WRAP_STRUCT_ASTRUCT(children,nchildren))\n"
    );
    assert_eq!(gen.memo().len(), 1);
}

#[test]
fn runs_are_independent() {
    let unit = parse(TREE).unwrap();
    let pairings = tree_pairings();
    let tree = unit.types.aggregate(AggregateKind::Struct, "tree").unwrap();

    let mut first = Generator::new(&unit.types, &pairings);
    assert!(first.needs_wrapper(tree).unwrap());

    // A fresh run starts with an empty memo and emits its own wrappers.
    let mut second = Generator::new(&unit.types, &pairings);
    assert!(second.memo().is_empty());
    assert!(second.needs_wrapper(tree).unwrap());
    assert_eq!(first.records(), second.records());
}

#[test]
fn shared_pairings_across_threads() {
    let pairings = tree_pairings();
    let expected = generate(TREE, &pairings, Format::Macros);

    thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    let records = syswrap::run(TREE, &pairings, &Config::default()).unwrap();
                    render(&records, Format::Macros)
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
