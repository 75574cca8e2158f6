use filament_common::{array, object, Value};
use filament_dom::{dispatch_event, Event, HostTree, MemoryTree, NodeId};
use filament_observer::{
    ComponentManifest, ComponentObserver, Lifecycle, ObserverConfig, ObserverError,
    UnsupportedInputPolicy,
};
use std::cell::RefCell;
use std::rc::Rc;

type Tree = Rc<RefCell<MemoryTree>>;

fn mount_with(
    manifest: &str,
    markup: &str,
    config: ObserverConfig,
) -> (Rc<ComponentObserver<MemoryTree>>, Tree, NodeId) {
    let manifest = ComponentManifest::from_json(manifest).unwrap();
    let (tree, root) = MemoryTree::from_markup(markup).unwrap();
    let tree = Rc::new(RefCell::new(tree));
    let observer = ComponentObserver::new(&manifest, tree.clone(), root, config);
    (observer, tree, root)
}

fn connect(manifest: &str, markup: &str) -> (Rc<ComponentObserver<MemoryTree>>, Tree, NodeId) {
    let (observer, tree, root) = mount_with(manifest, markup, ObserverConfig::default());
    observer.connect().unwrap();
    (observer, tree, root)
}

fn find(tree: &Tree, root: NodeId, selector: &str) -> NodeId {
    tree.borrow().query(root, selector).unwrap().unwrap()
}

fn html(tree: &Tree, node: NodeId) -> String {
    tree.borrow().inner_html(node)
}

#[test]
fn test_interpolation_follows_property() {
    let (observer, tree, root) = connect(
        r#"{ "name": "greeting", "properties": { "name": "Ada", "visits": 3 } }"#,
        "<p>Hello {{ name }}, visit #{{ visits + 1 }}!</p>",
    );
    assert_eq!(html(&tree, root), "<p>Hello Ada, visit #4!</p>");

    observer.state().set("name", "Grace").unwrap();
    observer.state().set("visits", 9).unwrap();
    assert_eq!(html(&tree, root), "<p>Hello Grace, visit #10!</p>");
}

#[test]
fn test_custom_interpolation_delimiters() {
    let config = ObserverConfig {
        interpolation_open: "[[".to_string(),
        interpolation_close: "]]".to_string(),
        ..ObserverConfig::default()
    };
    let (observer, tree, root) = mount_with(
        r#"{ "name": "delimiters", "properties": { "n": 1 } }"#,
        "<p>[[ n ]] {{ n }}</p>",
        config,
    );
    observer.connect().unwrap();
    assert_eq!(html(&tree, root), "<p>1 {{ n }}</p>");
}

#[test]
fn test_listeners_run_in_registration_order() {
    let (observer, _, _) = connect(r#"{ "name": "order", "properties": { "x": 0 } }"#, "<p></p>");
    let log = Rc::new(RefCell::new(Vec::new()));
    for tag in ["first", "second", "third"] {
        let log = log.clone();
        observer
            .state()
            .properties()
            .add_listener(
                "x",
                Rc::new(move |value: &Value| {
                    log.borrow_mut().push(format!("{}:{}", tag, value));
                    Ok(())
                }),
            )
            .unwrap();
    }

    observer.state().set("x", 5).unwrap();
    assert_eq!(*log.borrow(), vec!["first:5", "second:5", "third:5"]);
}

#[test]
fn test_list_mutation_and_computed_update_the_tree() {
    let (observer, tree, root) = connect(
        r#"{
            "name": "todos",
            "properties": { "items": ["a", "b"] },
            "computed": { "count": "items.length" }
        }"#,
        r#"<span>{{ count }} items</span><ul><li iterate="item in items">{{ item }}</li></ul>"#,
    );
    let span = find(&tree, root, "span");
    let ul = find(&tree, root, "ul");
    assert_eq!(html(&tree, span), "2 items");

    observer.state().list("items").unwrap().push("c").unwrap();
    assert_eq!(html(&tree, span), "3 items");
    assert_eq!(
        html(&tree, ul),
        "<!--iterate: item in items--><li>a</li><li>b</li><li>c</li>"
    );
}

#[test]
fn test_iteration_keeps_identity_of_surviving_items() {
    let (observer, tree, root) = connect(
        r#"{ "name": "letters", "properties": { "letters": ["A", "B", "C"] } }"#,
        r#"<ul><li iterate="letter in letters">{{ letter }}</li></ul>"#,
    );
    let before = tree.borrow().query_all(root, "li").unwrap();
    assert_eq!(before.len(), 3);

    observer.state().list("letters").unwrap().remove(1).unwrap();
    let after = tree.borrow().query_all(root, "li").unwrap();
    assert_eq!(after, vec![before[0], before[2]]);
    assert_eq!(tree.borrow().parent(before[1]), None);

    observer.state().list("letters").unwrap().reverse().unwrap();
    let reversed = tree.borrow().query_all(root, "li").unwrap();
    assert_eq!(reversed, vec![before[2], before[0]]);
    assert_eq!(
        html(&tree, find(&tree, root, "ul")),
        "<!--iterate: letter in letters--><li>C</li><li>A</li>"
    );
}

#[test]
fn test_iteration_edge_cases() {
    let (observer, tree, root) = connect(
        r#"{ "name": "edges", "properties": { "xs": [1, 1, 2] } }"#,
        r#"<ol><li iterate="x in xs">{{ x }}</li></ol>"#,
    );
    let ol = find(&tree, root, "ol");
    // equal items render once
    assert_eq!(html(&tree, ol), "<!--iterate: x in xs--><li>1</li><li>2</li>");

    observer.state().set("xs", Value::Null).unwrap();
    assert_eq!(html(&tree, ol), "<!--iterate: x in xs-->");

    assert!(matches!(
        observer.state().set("xs", 3),
        Err(ObserverError::InvalidIterationSource { .. })
    ));
}

#[test]
fn test_iteration_items_bind_their_own_directives() {
    let (observer, tree, root) = connect(
        r#"{
            "name": "picker",
            "properties": {
                "todos": [{ "id": 1, "title": "write" }, { "id": 2, "title": "test" }],
                "picked": null
            },
            "methods": { "pick": "picked = $event" }
        }"#,
        r#"<ul><li iterate="todo in todos" :data-id="todo.id" @click="picked = todo.title">{{ todo.title }}</li></ul>"#,
    );
    let items = tree.borrow().query_all(root, "li").unwrap();
    assert_eq!(tree.borrow().get_attribute(items[1], "data-id").as_deref(), Some("2"));

    dispatch_event(&tree, items[1], &Event::new("click")).unwrap();
    assert_eq!(observer.state().get("picked").unwrap(), Value::from("test"));
}

#[test]
fn test_nested_iteration_sees_outer_item() {
    let (_, tree, root) = connect(
        r#"{ "name": "grid", "properties": { "rows": ["r1", "r2"], "cols": ["a", "b"] } }"#,
        r#"<table><tr iterate="row in rows"><td iterate="col in cols">{{ row }}{{ col }}</td></tr></table>"#,
    );
    let cells: Vec<String> = {
        let tree = tree.borrow();
        tree.query_all(root, "td")
            .unwrap()
            .into_iter()
            .map(|cell| tree.text_content(cell))
            .collect()
    };
    assert_eq!(cells, vec!["r1a", "r1b", "r2a", "r2b"]);
}

#[test]
fn test_conditional_keeps_node_identity() {
    let (observer, tree, root) = connect(
        r#"{ "name": "toggle", "properties": { "show": true } }"#,
        r#"<div><p if="show">x</p></div>"#,
    );
    let div = find(&tree, root, "div");
    let p = find(&tree, root, "p");

    observer.state().set("show", false).unwrap();
    assert_eq!(html(&tree, div), "<!--if: show-->");
    assert_eq!(tree.borrow().parent(p), None);

    observer.state().set("show", true).unwrap();
    assert_eq!(find(&tree, root, "p"), p);
    assert_eq!(tree.borrow().parent(p), Some(div));
}

#[test]
fn test_conditional_starts_hidden() {
    let (observer, tree, root) = connect(
        r#"{ "name": "hidden", "properties": { "items": [] } }"#,
        r#"<section><em if="items.length > 0">{{ items.length }}</em></section>"#,
    );
    let section = find(&tree, root, "section");
    assert_eq!(html(&tree, section), "<!--if: items.length > 0-->");

    observer.state().list("items").unwrap().push(7).unwrap();
    assert_eq!(tree.borrow().text_content(section), "1");
}

#[test]
fn test_hidden_iteration_item_is_removed_with_its_placeholder() {
    let (observer, tree, root) = connect(
        r#"{ "name": "filtered", "properties": { "xs": [1, 2, 3], "limit": 2 } }"#,
        r#"<ul><li iterate="x in xs" if="x < limit">{{ x }}</li></ul>"#,
    );
    let ul = find(&tree, root, "ul");
    assert_eq!(tree.borrow().text_content(ul), "1");

    observer.state().list("xs").unwrap().remove(1).unwrap();
    observer.state().set("limit", 10).unwrap();
    assert_eq!(tree.borrow().text_content(ul), "13");
}

#[test]
fn test_removed_item_releases_hidden_descendants() {
    let (observer, tree, root) = connect(
        r#"{ "name": "hidden", "properties": { "ts": [1, 2], "show": false, "n": 0 } }"#,
        r#"<ul><li iterate="t in ts"><b if="show" @click="n = n + 1">{{ t }}</b></li></ul>"#,
    );
    assert_eq!(observer.event_listener_count(), 2);
    assert_eq!(tree.borrow().total_listener_count(), 2);

    observer.state().list("ts").unwrap().remove(0).unwrap();
    assert_eq!(observer.event_listener_count(), 1);
    assert_eq!(tree.borrow().total_listener_count(), 1);

    observer.state().set("show", true).unwrap();
    let ul = find(&tree, root, "ul");
    assert_eq!(tree.borrow().text_content(ul), "2");
    dispatch_event(&tree, find(&tree, root, "b"), &Event::new("click")).unwrap();
    assert_eq!(observer.state().get("n").unwrap(), Value::from(1));
}

#[test]
fn test_text_input_round_trip_without_feedback() {
    let (observer, tree, root) = connect(
        r#"{ "name": "form", "properties": { "name": "Ada" } }"#,
        r#"<input bind="name">"#,
    );
    let input = find(&tree, root, "input");
    assert_eq!(tree.borrow().value(input), "Ada");

    let writes = Rc::new(RefCell::new(0));
    let counter = writes.clone();
    observer
        .state()
        .properties()
        .add_listener(
            "name",
            Rc::new(move |_: &Value| {
                *counter.borrow_mut() += 1;
                Ok(())
            }),
        )
        .unwrap();

    tree.borrow_mut().set_value(input, "Bob").unwrap();
    dispatch_event(&tree, input, &Event::new("input")).unwrap();
    assert_eq!(observer.state().get("name").unwrap(), Value::from("Bob"));
    assert_eq!(*writes.borrow(), 1);

    // `change` after `input` carries the same value and writes nothing
    dispatch_event(&tree, input, &Event::new("change")).unwrap();
    assert_eq!(*writes.borrow(), 1);

    observer.state().set("name", "Cy").unwrap();
    assert_eq!(tree.borrow().value(input), "Cy");
}

#[test]
fn test_number_checkbox_and_textarea_inputs() {
    let (observer, tree, root) = connect(
        r#"{ "name": "controls", "properties": { "qty": 2, "agree": false, "notes": "hi" } }"#,
        r#"<input type="number" bind="qty"><input type="checkbox" bind="agree"><textarea bind="notes"></textarea>"#,
    );
    let number = find(&tree, root, "input[type=number]");
    let checkbox = find(&tree, root, "input[type=checkbox]");
    let textarea = find(&tree, root, "textarea");
    assert_eq!(tree.borrow().value(number), "2");
    assert_eq!(tree.borrow().value(textarea), "hi");

    tree.borrow_mut().set_value(number, "3.5").unwrap();
    dispatch_event(&tree, number, &Event::new("input")).unwrap();
    assert_eq!(observer.state().get("qty").unwrap(), Value::from(3.5));

    tree.borrow_mut().set_value(number, "abc").unwrap();
    dispatch_event(&tree, number, &Event::new("change")).unwrap();
    assert!(observer.state().get("qty").unwrap().to_number().is_nan());

    tree.borrow_mut().set_checked(checkbox, true).unwrap();
    dispatch_event(&tree, checkbox, &Event::new("change")).unwrap();
    assert_eq!(observer.state().get("agree").unwrap(), Value::from(true));
    observer.state().set("agree", false).unwrap();
    assert!(!tree.borrow().checked(checkbox));

    tree.borrow_mut().set_value(textarea, "typed").unwrap();
    dispatch_event(&tree, textarea, &Event::new("input")).unwrap();
    assert_eq!(observer.state().get("notes").unwrap(), Value::from("typed"));
}

#[test]
fn test_radio_group() {
    let (observer, tree, root) = connect(
        r#"{ "name": "sizes", "properties": { "size": "m" } }"#,
        r#"<input type="radio" name="size" value="s" bind="size"><input type="radio" name="size" value="m" bind="size">"#,
    );
    let small = find(&tree, root, "input[value=s]");
    let medium = find(&tree, root, "input[value=m]");
    assert!(!tree.borrow().checked(small));
    assert!(tree.borrow().checked(medium));

    tree.borrow_mut().set_checked(small, true).unwrap();
    dispatch_event(&tree, small, &Event::new("change")).unwrap();
    assert_eq!(observer.state().get("size").unwrap(), Value::from("s"));
    assert!(!tree.borrow().checked(medium));

    observer.state().set("size", "m").unwrap();
    assert!(tree.borrow().checked(medium));
    assert!(!tree.borrow().checked(small));
}

#[test]
fn test_select_options_from_items() {
    let (observer, tree, root) = connect(
        r#"{
            "name": "colors",
            "properties": {
                "color": "g",
                "colors": [{ "id": "r", "name": "Red" }, { "id": "g", "name": "Green" }]
            }
        }"#,
        r#"<select bind="color" items="colors" value-name="id" label-name="name"></select>"#,
    );
    let select = find(&tree, root, "select");
    assert_eq!(
        html(&tree, select),
        r#"<option value="r">Red</option><option value="g">Green</option>"#
    );
    assert_eq!(tree.borrow().value(select), "g");

    tree.borrow_mut().set_value(select, "r").unwrap();
    dispatch_event(&tree, select, &Event::new("change")).unwrap();
    assert_eq!(observer.state().get("color").unwrap(), Value::from("r"));

    observer
        .state()
        .list("colors")
        .unwrap()
        .push(object([("id", "b"), ("name", "Blue")]))
        .unwrap();
    assert_eq!(tree.borrow().options(select).len(), 3);
    // the selection survives the rebuild
    assert_eq!(tree.borrow().value(select), "r");

    observer.state().set("color", "b").unwrap();
    assert_eq!(tree.borrow().value(select), "b");
}

#[test]
fn test_select_items_mapping_and_defaults() {
    let (observer, tree, root) = connect(
        r#"{ "name": "sizes", "properties": { "size": "M", "sizes": { "Small": "S", "Medium": "M" } } }"#,
        r#"<select bind="size" items="sizes"></select>"#,
    );
    let select = find(&tree, root, "select");
    assert_eq!(
        html(&tree, select),
        r#"<option value="S">Small</option><option value="M">Medium</option>"#
    );
    assert_eq!(tree.borrow().value(select), "M");

    assert!(matches!(
        observer.state().set("sizes", "nope"),
        Err(ObserverError::InvalidItemsSource { .. })
    ));
}

#[test]
fn test_unknown_bind_target_binds_nothing() {
    let (observer, tree, _) = mount_with(
        r#"{ "name": "broken", "properties": { "count": 0 }, "methods": { "go": "count = 1" } }"#,
        r#"<button @click="go">go</button><input bind="doesNotExist">"#,
        ObserverConfig::default(),
    );
    assert!(matches!(
        observer.connect(),
        Err(ObserverError::UnknownProperty { ref name }) if name == "doesNotExist"
    ));
    assert_eq!(observer.event_listener_count(), 0);
    assert_eq!(tree.borrow().total_listener_count(), 0);
    assert_eq!(observer.state().properties().listener_count("count"), 0);
    assert_eq!(observer.lifecycle(), Lifecycle::Disconnected);
}

#[test]
fn test_structural_errors_fail_connect() {
    let cases = [
        (r#"<ul><li iterate="x of xs"></li></ul>"#, "malformed"),
        (r#"<ul><li iterate="x in missing"></li></ul>"#, "unknown"),
        (r#"<select bind="xs" items="missing"></select>"#, "unknown"),
        (r#"<p>{{ 1 + }}</p>"#, "expression"),
    ];
    for (markup, expected) in cases {
        let (observer, _, _) = mount_with(
            r#"{ "name": "broken", "properties": { "xs": [] } }"#,
            markup,
            ObserverConfig::default(),
        );
        let err = observer.connect().unwrap_err();
        let matched = match expected {
            "malformed" => matches!(err, ObserverError::MalformedDirective { .. }),
            "unknown" => matches!(err, ObserverError::UnknownProperty { .. }),
            _ => matches!(err, ObserverError::Expression { .. }),
        };
        assert!(matched, "{}: unexpected {:?}", markup, err);
    }
}

#[test]
fn test_unsupported_input_policy() {
    let markup = r#"<input type="file" bind="path">"#;
    let manifest = r#"{ "name": "upload", "properties": { "path": "" } }"#;

    let (observer, tree, _) = mount_with(manifest, markup, ObserverConfig::default());
    observer.connect().unwrap();
    assert_eq!(tree.borrow().total_listener_count(), 0);

    let strict = ObserverConfig {
        unsupported_inputs: UnsupportedInputPolicy::Error,
        ..ObserverConfig::default()
    };
    let (observer, _, _) = mount_with(manifest, markup, strict);
    assert!(matches!(
        observer.connect(),
        Err(ObserverError::UnsupportedInput { ref kind, .. }) if kind == "file"
    ));
}

#[test]
fn test_event_handlers() {
    let (observer, tree, root) = connect(
        r#"{
            "name": "events",
            "properties": { "count": 0, "picked": null, "last": "" },
            "methods": { "increment": "count = count + 1", "pick": "picked = $event" }
        }"#,
        r#"<button @click="increment">+</button><div @pick="pick"></div><input @input="last = $event.target.value + '!'">"#,
    );
    let button = find(&tree, root, "button");
    let div = find(&tree, root, "div");
    let input = find(&tree, root, "input");

    dispatch_event(&tree, button, &Event::new("click")).unwrap();
    dispatch_event(&tree, button, &Event::new("click")).unwrap();
    assert_eq!(observer.state().get("count").unwrap(), Value::from(2));

    dispatch_event(&tree, div, &Event::custom("pick", array([1, 2]))).unwrap();
    assert_eq!(observer.state().get("picked").unwrap(), array([1, 2]));

    tree.borrow_mut().set_value(input, "hey").unwrap();
    dispatch_event(&tree, input, &Event::new("input")).unwrap();
    assert_eq!(observer.state().get("last").unwrap(), Value::from("hey!"));
}

#[test]
fn test_emitted_events_reach_parent_handlers() {
    let (parent, tree, root) = connect(
        r#"{
            "name": "parent",
            "properties": { "got": null },
            "methods": { "onPicked": "got = $event" }
        }"#,
        r#"<section @picked="onPicked"><div class="slot"></div></section>"#,
    );
    let slot = find(&tree, root, "div.slot");
    let button = {
        let mut host = tree.borrow_mut();
        let button = host.create_element("button");
        host.set_attribute(button, "@click", "pick").unwrap();
        host.append_child(slot, button).unwrap();
        button
    };

    let manifest = ComponentManifest::from_json(
        r#"{
            "name": "child",
            "properties": { "choice": 42 },
            "methods": { "pick": "$emit('picked', { value: choice })" }
        }"#,
    )
    .unwrap();
    let child = ComponentObserver::new(&manifest, tree.clone(), slot, ObserverConfig::default());
    child.connect().unwrap();

    dispatch_event(&tree, button, &Event::new("click")).unwrap();
    assert_eq!(
        parent.state().get("got").unwrap(),
        object([("value", Value::from(42))])
    );

    child.disconnect().unwrap();
    parent.state().set("got", Value::Null).unwrap();
    child.state().emit("picked", 1).unwrap();
    assert_eq!(parent.state().get("got").unwrap(), Value::Null);
}

#[test]
fn test_attribute_class_and_style_bindings() {
    let (observer, tree, root) = connect(
        r#"{ "name": "styled", "properties": { "on": true, "size": 12, "label": "hi", "locked": false } }"#,
        r#"<p class="base" :class="{ active: on, idle: !on }" :style="{ fontSize: size + 'px', color: null }" :title="label" :disabled="locked"></p>"#,
    );
    let p = find(&tree, root, "p");
    {
        let tree = tree.borrow();
        assert!(tree.has_class(p, "base"));
        assert!(tree.has_class(p, "active"));
        assert!(!tree.has_class(p, "idle"));
        assert_eq!(tree.get_style(p, "font-size").as_deref(), Some("12px"));
        assert_eq!(tree.get_attribute(p, "title").as_deref(), Some("hi"));
        assert!(!tree.has_attribute(p, "disabled"));
    }

    observer.state().set("on", false).unwrap();
    observer.state().set("size", 14).unwrap();
    observer.state().set("locked", true).unwrap();
    let tree = tree.borrow();
    assert!(tree.has_class(p, "idle"));
    assert!(!tree.has_class(p, "active"));
    assert_eq!(tree.get_style(p, "font-size").as_deref(), Some("14px"));
    assert_eq!(tree.get_attribute(p, "disabled").as_deref(), Some("true"));
}

#[test]
fn test_class_binding_must_be_an_object() {
    let (observer, _, _) = mount_with(
        r#"{ "name": "bad", "properties": { "c": "x" } }"#,
        r#"<p :class="c"></p>"#,
        ObserverConfig::default(),
    );
    assert!(matches!(
        observer.connect(),
        Err(ObserverError::TypeMismatch { .. })
    ));
}

#[test]
fn test_watchers_run_on_connect_and_change() {
    let (observer, _, _) = connect(
        r#"{
            "name": "watched",
            "properties": { "query": "a", "history": [] },
            "methods": { "record": "history.push($event)" },
            "watch": [{ "property": "query", "method": "record" }]
        }"#,
        "<p></p>",
    );
    observer.state().set("query", "ab").unwrap();
    assert_eq!(observer.state().get("history").unwrap(), array(["a", "ab"]));
}

#[test]
fn test_lifecycle() {
    let (observer, tree, root) = mount_with(
        r#"{ "name": "life", "properties": { "count": 0 }, "methods": { "go": "count = count + 1" } }"#,
        r#"<button @click="go">go</button>"#,
        ObserverConfig::default(),
    );
    assert!(matches!(
        observer.disconnect(),
        Err(ObserverError::Lifecycle { operation: "disconnect", .. })
    ));

    observer.connect().unwrap();
    assert_eq!(observer.lifecycle(), Lifecycle::Connected);
    assert_eq!(observer.event_listener_count(), 1);
    assert!(matches!(
        observer.connect(),
        Err(ObserverError::Lifecycle { operation: "connect", .. })
    ));

    observer.disconnect().unwrap();
    assert_eq!(tree.borrow().total_listener_count(), 0);
    let button = find(&tree, root, "button");
    dispatch_event(&tree, button, &Event::new("click")).unwrap();
    assert_eq!(observer.state().get("count").unwrap(), Value::from(0));
    assert!(observer.connect().is_err());
}

#[test]
fn test_dropping_the_observer_stops_bindings() {
    let (observer, tree, root) = connect(
        r#"{ "name": "dropped", "properties": { "n": 1 } }"#,
        "<p>{{ n }}</p>",
    );
    let state = observer.state().clone();
    drop(observer);

    state.set("n", 2).unwrap();
    assert_eq!(html(&tree, root), "<p>1</p>");
}

#[test]
fn test_select_items_with_default_fields() {
    let (observer, tree, root) = connect(
        r#"{
            "name": "options",
            "properties": {
                "choice": "1",
                "opts": [{ "label": "X", "value": "1" }, { "label": "Y", "value": "2" }]
            }
        }"#,
        r#"<select bind="choice" items="opts"></select>"#,
    );
    let select = find(&tree, root, "select");
    assert_eq!(
        html(&tree, select),
        r#"<option value="1">X</option><option value="2">Y</option>"#
    );

    observer.state().set("choice", "2").unwrap();
    assert_eq!(tree.borrow().selected_index(select), Some(1));
}
