use filament_common::Value;
use filament_dom::{dispatch_event, Event, HandlerError, HostTree, MemoryTree, NodeKind};
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn test_parse_mutate_serialize() {
    let (mut tree, root) =
        MemoryTree::from_markup(r#"<div id="app"><p class="a">Hi</p><input value="x"></div>"#)
            .unwrap();
    let p = tree.query(root, "p").unwrap().unwrap();
    let input = tree.query(root, "input").unwrap().unwrap();

    tree.add_class(p, "b").unwrap();
    tree.remove_class(p, "a").unwrap();
    tree.set_style(p, "fontSize", Some("12px")).unwrap();
    tree.set_text(p, "Bye").unwrap();
    tree.set_value(input, "typed").unwrap();

    assert_eq!(
        tree.to_html(root),
        r#"<div id="app"><p class="b" style="font-size: 12px;">Bye</p><input value="x"></div>"#
    );
    // the live value is not reflected into the attribute
    assert_eq!(tree.value(input), "typed");
}

#[test]
fn test_detached_nodes_can_be_reinserted() {
    let (mut tree, root) = MemoryTree::from_markup("<section><b>x</b></section>").unwrap();
    let section = tree.children(root)[0];
    let b = tree.children(section)[0];
    let anchor = tree.create_comment("anchor");

    tree.replace(b, anchor).unwrap();
    assert_eq!(tree.parent(b), None);
    assert_eq!(tree.inner_html(section), "<!--anchor-->");

    tree.insert_before(section, b, tree.next_sibling(anchor)).unwrap();
    assert_eq!(tree.inner_html(section), "<!--anchor--><b>x</b>");
    assert_eq!(tree.kind(anchor).unwrap(), NodeKind::Comment);
}

#[test]
fn test_handlers_can_mutate_the_tree_during_dispatch() {
    let (tree, root) = MemoryTree::from_markup("<ul><li><button>+</button></li></ul>").unwrap();
    let button = tree.query(root, "button").unwrap().unwrap();
    let ul = tree.query(root, "ul").unwrap().unwrap();
    let tree = Rc::new(RefCell::new(tree));

    let handle = tree.clone();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = seen.clone();
    tree.borrow_mut()
        .add_event_listener(
            ul,
            "add",
            Rc::new(move |event: &Event| -> Result<(), HandlerError> {
                log.borrow_mut().push(event.detail.clone().unwrap_or_default());
                let mut tree = handle.borrow_mut();
                let li = tree.create_element("li");
                tree.append_child(ul, li)?;
                Ok(())
            }),
        )
        .unwrap();

    let invoked = dispatch_event(&tree, button, &Event::custom("add", 3).bubbling()).unwrap();
    assert_eq!(invoked, 1);
    assert_eq!(*seen.borrow(), vec![Value::Number(3.0)]);
    assert_eq!(tree.borrow().children(ul).len(), 2);

    // non-bubbling events stay on the target
    let invoked = dispatch_event(&tree, button, &Event::new("add")).unwrap();
    assert_eq!(invoked, 0);
}
