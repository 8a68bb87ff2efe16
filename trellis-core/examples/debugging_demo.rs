//! The debugging-demo application rebuilt on the core.
//!
//! The original demo shipped four deliberate defects. Each is corrected
//! here by construction:
//!
//! 1. Counter effects declare `Deps::watch([count])` instead of running
//!    after every commit.
//! 2. The user list is keyed by user id, so reordering preserves each
//!    row's identity.
//! 3. Cart totals multiply `price * quantity` and are derived in render,
//!    never stored.
//! 4. The status indicator's props do not change when counters do, so it
//!    never re-renders with them.
//!
//! Run with `cargo run --example debugging_demo`. The patch stream each
//! flush produces is printed the way a host display surface would
//! receive it.

use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

use serde_json::json;

use trellis_core::{component, CellId, Deps, Key, PatchSet, Props, Runtime, Value, ViewNode};

fn summarize(label: &str, patches: &PatchSet) {
    println!("== {label}");
    println!("{}", serde_json::to_string_pretty(patches).expect("patches serialize"));
}

fn main() -> Result<(), Box<dyn Error>> {
    let counter_cells: Arc<Mutex<HashMap<String, CellId>>> = Arc::new(Mutex::new(HashMap::new()));
    let app_cells: Arc<Mutex<HashMap<&'static str, CellId>>> = Arc::new(Mutex::new(HashMap::new()));

    // Bug 1 corrected: the logging effect watches [count]; commits that
    // leave the count unchanged do not re-run it.
    let counter = component("counter", {
        let counter_cells = counter_cells.clone();
        move |props, scope| {
            let label = props.string("label").unwrap_or_default().to_owned();
            let count = scope.cell(props.number("initial").unwrap_or(0.0))?;
            counter_cells.lock().unwrap().insert(label.clone(), count);

            let value = scope.read(count)?;
            let logged_label = label.clone();
            let logged_value = value.clone();
            scope.effect(Deps::watch([value.clone()]), move || {
                println!("counter \"{logged_label}\" updated: {logged_value}");
                None
            })?;

            Ok(ViewNode::element("div")
                .prop("class", "counter")
                .child(ViewNode::text(label))
                .child(ViewNode::text(format!("{value}")))
                .into())
        }
    });

    // Bug 2 corrected: rows are keyed by user id, not position.
    let user_list = component("user-list", |props, _scope| {
        let users = props.get("users").and_then(Value::as_array).cloned().unwrap_or_default();
        let rows = users.into_iter().map(|user| {
            let id = user.get("id").and_then(Value::as_u64).unwrap_or_default();
            let name = user.get("name").and_then(Value::as_str).unwrap_or_default().to_owned();
            let email = user.get("email").and_then(Value::as_str).unwrap_or_default().to_owned();
            (
                Key::from(id),
                ViewNode::element("li")
                    .child(ViewNode::text(name))
                    .child(ViewNode::text(email))
                    .into(),
            )
        });
        Ok(ViewNode::element("ul").prop("class", "users").keyed(rows.collect::<Vec<_>>()).into())
    });

    // Bug 3 corrected: line totals and the aggregate multiply price by
    // quantity, recomputed from the items on every render.
    let cart = component("cart", |props, _scope| {
        let items = props.get("items").and_then(Value::as_array).cloned().unwrap_or_default();
        let mut rows = Vec::new();
        let mut cart_total = 0.0;
        for item in &items {
            let id = item.get("id").and_then(Value::as_u64).unwrap_or_default();
            let name = item.get("name").and_then(Value::as_str).unwrap_or_default().to_owned();
            let price = item.get("price").and_then(Value::as_f64).unwrap_or(0.0);
            let quantity = item.get("quantity").and_then(Value::as_f64).unwrap_or(0.0);
            let line_total = price * quantity;
            cart_total += line_total;
            rows.push((
                Key::from(id),
                ViewNode::element("li")
                    .child(ViewNode::text(name))
                    .child(ViewNode::text(format!("{quantity} x {price:.2}")))
                    .child(ViewNode::text(format!("{line_total:.2}")))
                    .into(),
            ));
        }
        Ok(ViewNode::element("div")
            .prop("class", "cart")
            .child(ViewNode::element("ul").keyed(rows))
            .child(ViewNode::text(format!("Total: {cart_total:.2}")))
            .into())
    });

    // Bug 4 corrected: the status props stay constant while counters
    // change, so the reconciler never touches this subtree.
    let status = component("status", |props, _scope| {
        let state = props.string("status").unwrap_or("pending").to_owned();
        let message = props.string("message").unwrap_or_default().to_owned();
        Ok(ViewNode::element("div")
            .prop("class", format!("status-{state}"))
            .child(ViewNode::text(message))
            .into())
    });

    let app = component("app", {
        let app_cells = app_cells.clone();
        move |_props, scope| {
            let users = scope.cell(json!([
                { "id": 1, "name": "Alice Johnson", "email": "alice@example.com" },
                { "id": 2, "name": "Bob Smith", "email": "bob@example.com" },
                { "id": 3, "name": "Charlie Brown", "email": "charlie@example.com" },
            ]))?;
            let items = scope.cell(json!([
                { "id": 1, "name": "Laptop", "price": 999.99, "quantity": 1 },
                { "id": 2, "name": "Mouse", "price": 29.99, "quantity": 2 },
                { "id": 3, "name": "Keyboard", "price": 79.99, "quantity": 1 },
            ]))?;
            {
                let mut cells = app_cells.lock().unwrap();
                cells.insert("users", users);
                cells.insert("items", items);
            }

            let users_value = scope.read(users)?;
            let items_value = scope.read(items)?;

            Ok(ViewNode::element("main")
                .child(ViewNode::component(
                    counter.clone(),
                    Props::new().with("label", "Counter A").with("initial", 0),
                ))
                .child(ViewNode::component(
                    counter.clone(),
                    Props::new().with("label", "Counter B").with("initial", 10),
                ))
                .child(ViewNode::component(
                    status.clone(),
                    Props::new()
                        .with("status", "success")
                        .with("message", "Application loaded successfully"),
                ))
                .child(ViewNode::component(
                    user_list.clone(),
                    Props::new().with("users", users_value),
                ))
                .child(ViewNode::component(
                    cart.clone(),
                    Props::new().with("items", items_value),
                ))
                .into())
        }
    });

    let mut rt = Runtime::new();
    let patches = rt.mount(app, Props::new())?;
    summarize("initial mount", &patches);
    println!("mounted instances: {}", rt.instance_count());

    // Two increments of Counter A within one tick coalesce into a single
    // render observing the final value.
    let counter_a = *counter_cells.lock().unwrap().get("Counter A").expect("counter mounted");
    rt.write(counter_a, 1);
    rt.write(counter_a, 2);
    let patches = rt.settle(8)?;
    summarize("counter A incremented twice in one tick", &patches);

    // Reordering the users reorders keyed rows in place; no row is
    // rebuilt, and the counters are untouched.
    let users_cell = *app_cells.lock().unwrap().get("users").expect("app mounted");
    rt.write(
        users_cell,
        json!([
            { "id": 3, "name": "Charlie Brown", "email": "charlie@example.com" },
            { "id": 1, "name": "Alice Johnson", "email": "alice@example.com" },
            { "id": 2, "name": "Bob Smith", "email": "bob@example.com" },
        ]),
    );
    let patches = rt.settle(8)?;
    summarize("users reordered", &patches);
    println!(
        "counter A still reads {:?} after the reorder",
        rt.read(counter_a)
    );

    Ok(())
}
