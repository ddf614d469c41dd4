use std::sync::Arc;

use hn_components::{Boundary, ElementKind, Pipe};
use hn_core::units::{k, m, pa};
use hn_fluids::FluidTable;
use hn_graph::PortRef;
use hn_solver::Network;
use proptest::prelude::*;

fn chain(pipes: usize) -> Network {
    let mut net = Network::new(Arc::new(FluidTable::water()));
    let mut last = net
        .add_element("head", ElementKind::Boundary(Boundary::pressure(pa(2e5), k(340.0))))
        .unwrap();
    let mut last_port = 0;
    for i in 0..pipes {
        let p = net
            .add_element(
                format!("p{i}"),
                ElementKind::Pipe(Pipe::new(m(10.0), m(0.1), m(1e-4)).unwrap()),
            )
            .unwrap();
        net.connect(PortRef::new(last, last_port), PortRef::new(p, 0))
            .unwrap();
        last = p;
        last_port = 1;
    }
    let tail = net
        .add_element("tail", ElementKind::Boundary(Boundary::pressure(pa(1e5), k(300.0))))
        .unwrap();
    net.connect(PortRef::new(last, last_port), PortRef::new(tail, 0))
        .unwrap();
    net
}

proptest! {
    #[test]
    fn indices_tile_the_unknown_vector(pipes in 0usize..12) {
        let mut net = chain(pipes);
        let total = net.assign_indices();

        let mut blocks: Vec<(usize, usize)> = net
            .elements()
            .map(|e| (e.matrix_index(), e.number_of_unknowns()))
            .chain(net.nodes().map(|n| (n.matrix_index(), n.number_of_unknowns())))
            .collect();
        let element_end: usize = net.elements().map(|e| e.number_of_unknowns()).sum();
        prop_assert!(net.nodes().all(|n| n.matrix_index() >= element_end));

        blocks.sort();
        let mut expected = 0;
        for (start, len) in blocks {
            prop_assert_eq!(start, expected);
            expected += len;
        }
        prop_assert_eq!(expected, total);
        prop_assert_eq!(total, 3 * (2 + 2 * pipes) + 3 * (pipes + 1));

        let rows = net.collect_equations(false).unwrap();
        prop_assert_eq!(rows.len(), total);
        prop_assert!(rows.iter().all(|r| r.max_index().is_some_and(|i| i < total)));
    }
}
