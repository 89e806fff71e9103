//! Snapshot round-trip: the node and link tables survive, the states do not.

use murmur_core::{
    ConceptNetwork, CoreError, Node, NodeKey, NodeKind, PropagationParams, State, TokenPosition,
};

fn sample_network() -> ConceptNetwork {
    let mut cn = ConceptNetwork::new();
    let from = cn.add_node(Node::basic("From")).unwrap();
    let to = cn.add_node(Node::basic("To1")).unwrap();
    let hello = cn
        .add_node(Node::token("hello", TokenPosition::Beginning))
        .unwrap();
    cn.add_node(Node::token("hello", TokenPosition::End)).unwrap();
    cn.add_link(from, to, None).unwrap();
    cn.add_link(from, hello, None).unwrap();
    cn
}

#[test]
fn restored_network_has_the_same_nodes_and_links() {
    let cn = sample_network();
    let bytes = cn.dump().unwrap();
    let restored = ConceptNetwork::restore(&bytes).unwrap();

    assert_eq!(restored.node_count(), cn.node_count());
    assert_eq!(restored.link_count(), cn.link_count());
    for (_, node) in cn.nodes() {
        let twin = restored.get_node(node.symbol(), node.kind()).unwrap();
        assert_eq!(twin.occurrence(), node.occurrence());
        assert_eq!(twin.variant(), node.variant());
    }
}

#[test]
fn restored_network_has_no_states() {
    let mut cn = sample_network();
    cn.add_state(State::new("alice")).unwrap();
    cn.add_state(State::new("bob")).unwrap();

    let bytes = cn.dump().unwrap();
    let restored = ConceptNetwork::restore(&bytes).unwrap();

    assert_eq!(restored.state_ids().count(), 0);
    assert!(matches!(
        restored.state("alice"),
        Err(CoreError::UnknownState(_))
    ));
}

#[test]
fn dumping_leaves_live_states_untouched() {
    let mut cn = sample_network();
    cn.add_state(State::new("alice")).unwrap();
    cn.state_mut("alice")
        .unwrap()
        .fully_activate(&NodeKey::new("From", NodeKind::Basic));

    let _bytes = cn.dump().unwrap();

    let state = cn.state("alice").unwrap();
    assert_eq!(
        state.activation(&NodeKey::new("From", NodeKind::Basic)),
        100.0
    );
}

#[test]
fn restored_network_still_propagates() {
    let cn = sample_network();
    let bytes = cn.dump().unwrap();
    let mut restored = ConceptNetwork::restore(&bytes).unwrap();

    restored.add_state(State::new("alice")).unwrap();
    restored
        .state_mut("alice")
        .unwrap()
        .set_activation(&NodeKey::new("From", NodeKind::Basic), 100.0)
        .unwrap();
    restored
        .fast_propagate_activations("alice", PropagationParams::fast())
        .unwrap();
    assert!(
        restored
            .state("alice")
            .unwrap()
            .activation(&NodeKey::new("To1", NodeKind::Basic))
            > 0.0
    );
}

#[test]
fn adjacency_survives_the_round_trip() {
    let cn = sample_network();
    let bytes = cn.dump().unwrap();
    let restored = ConceptNetwork::restore(&bytes).unwrap();

    let from = restored.node_id("From", NodeKind::Basic).unwrap();
    assert_eq!(restored.links_from(from).unwrap().len(), 2);
}
