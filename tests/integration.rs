//! End-to-end scenarios: a store bridged to a document host, local writes and
//! external writes picked up by the observer.

use gosub_cookie_store::cookies::{parse, serialize, EventType, Listener};
use gosub_cookie_store::{ChangeSet, CookieChangeEvent, CookieItem, CookieObserver, CookieStore, DocumentCookie};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn recorder() -> (Listener, Arc<Mutex<Vec<ChangeSet>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = seen.clone();
    let listener: Listener = Arc::new(move |ev: &CookieChangeEvent| {
        s.lock().unwrap().push(ev.detail().clone());
    });
    (listener, seen)
}

#[tokio::test]
async fn set_on_prefilled_store() {
    let document = DocumentCookie::new("foo=bar; fizz=buzz");
    let store = CookieStore::bridged(Arc::new(document.clone()));
    let (listener, seen) = recorder();
    let (onchange, seen_onchange) = recorder();
    store.add_event_listener(EventType::Change, listener);
    store.set_onchange(Some(onchange));

    store.set("hello", "world").await.unwrap();

    let all = store.get_all(None).await;
    assert_eq!(all.len(), 3);
    for item in [
        CookieItem::new("foo", "bar"),
        CookieItem::new("fizz", "buzz"),
        CookieItem::new("hello", "world"),
    ] {
        assert!(all.contains(&item), "missing {:?}", item);
    }
    assert!(document.read().contains("hello=world"));

    assert_eq!(*seen.lock().unwrap(), vec![ChangeSet::changed("hello", "world")]);
    assert_eq!(*seen_onchange.lock().unwrap(), vec![ChangeSet::changed("hello", "world")]);

    let foo = store.get("foo").await.unwrap();
    store.delete("foo").await.unwrap();

    assert!(!document.read().contains(&format!("foo={}", foo.value)));
    assert_eq!(store.get("foo").await, None);
    assert_eq!(seen.lock().unwrap().len(), 2);
    assert_eq!(seen_onchange.lock().unwrap()[1], ChangeSet::deleted("foo"));
}

#[tokio::test(start_paused = true)]
async fn external_write_reaches_observer_after_one_tick() {
    let document = DocumentCookie::default();
    let store = Arc::new(CookieStore::bridged(Arc::new(document.clone())));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = seen.clone();
    let mut observer = CookieObserver::new(move |changes: &ChangeSet| {
        s.lock().unwrap().push(changes.clone());
    });

    observer.observe(&store).unwrap();
    document.write("foo=bar");
    assert!(seen.lock().unwrap().is_empty());

    tokio::time::sleep(Duration::from_millis(110)).await;
    assert_eq!(
        *seen.lock().unwrap(),
        vec![ChangeSet {
            changed: vec![CookieItem::new("foo", "bar")],
            deleted: vec![],
        }]
    );

    observer.unobserve();
    document.write("foo=baz; other=1");
    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn mixed_external_changes_arrive_as_one_event() {
    let document = DocumentCookie::new("a=1; b=2");
    let store = Arc::new(CookieStore::bridged(Arc::new(document.clone())));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = seen.clone();
    let mut observer = CookieObserver::new(move |changes: &ChangeSet| {
        s.lock().unwrap().push(changes.clone());
    });
    observer.observe(&store).unwrap();

    document.write("b=3; c=4");
    tokio::time::sleep(Duration::from_millis(150)).await;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(
        seen[0].changed,
        vec![CookieItem::new("b", "3"), CookieItem::new("c", "4")]
    );
    assert_eq!(seen[0].deleted.len(), 1);
    assert_eq!(seen[0].deleted[0].name, "a");
}

#[test]
fn flat_round_trip_is_mapping_equivalent() {
    for flat in ["", "foo=bar", "foo=bar; fizz=buzz", "x=1; y=; z=3"] {
        let reparsed = parse(&serialize(&parse(flat)));
        assert!(reparsed.same_entries(&parse(flat)), "{:?}", flat);
    }
}
