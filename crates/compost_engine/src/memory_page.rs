//! In-memory host page.
//!
//! Markup is parsed with `scraper` and kept as its `ego_tree` so that nodes
//! can be inserted, detached and re-rendered the way a single-page app
//! does it. Element identity is the tree's `NodeId`; a re-render produces
//! new ids for the same logical items.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::time::Duration;

use compost_logging::{compost_info, compost_warn};
use ego_tree::{NodeId, NodeRef, Tree};
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use tokio::sync::mpsc;

use crate::page::{HostPage, HostSurface, PageEvent, UiEvent, CONTROL_CLASS};

type ClickHandler = Rc<dyn Fn(&MemoryPage, NodeId)>;

/// Owned copy of a subtree, used to move markup between trees.
struct Subtree {
    value: Node,
    children: Vec<Subtree>,
}

impl Subtree {
    fn capture(node: NodeRef<'_, Node>, skip: &dyn Fn(NodeRef<'_, Node>) -> bool) -> Self {
        Self {
            value: node.value().clone(),
            children: node
                .children()
                .filter(|child| !skip(*child))
                .map(|child| Subtree::capture(child, skip))
                .collect(),
        }
    }

    fn graft(self, tree: &mut Tree<Node>, parent: NodeId, prepend: bool) -> Option<NodeId> {
        let mut parent_node = tree.get_mut(parent)?;
        let id = if prepend {
            parent_node.prepend(self.value).id()
        } else {
            parent_node.append(self.value).id()
        };
        for child in self.children {
            child.graft(tree, id, false);
        }
        Some(id)
    }
}

fn parse_fragment(markup: &str) -> Vec<Subtree> {
    let fragment = Html::parse_fragment(markup);
    fragment
        .root_element()
        .children()
        .map(|child| Subtree::capture(child, &|_| false))
        .collect()
}

fn is_control(node: NodeRef<'_, Node>) -> bool {
    node.value()
        .as_element()
        .is_some_and(|element| element.classes().any(|class| class == CONTROL_CLASS))
}

pub struct MemoryPage {
    document: RefCell<Html>,
    control_template: Option<Node>,
    selectors: RefCell<HashMap<String, Option<Selector>>>,
    checked: RefCell<HashSet<NodeId>>,
    removed: RefCell<HashSet<NodeId>>,
    click_handlers: RefCell<Vec<(String, ClickHandler)>>,
    dispatched: RefCell<Vec<(NodeId, UiEvent)>>,
    subscribers: RefCell<Vec<mpsc::UnboundedSender<PageEvent<NodeId>>>>,
}

impl MemoryPage {
    pub fn from_html(markup: &str) -> Self {
        let control_template = parse_fragment(&format!(
            r#"<input type="checkbox" class="{CONTROL_CLASS}">"#
        ))
        .into_iter()
        .next()
        .map(|subtree| subtree.value);

        Self {
            document: RefCell::new(Html::parse_document(markup)),
            control_template,
            selectors: RefCell::new(HashMap::new()),
            checked: RefCell::new(HashSet::new()),
            removed: RefCell::new(HashSet::new()),
            click_handlers: RefCell::new(Vec::new()),
            dispatched: RefCell::new(Vec::new()),
            subscribers: RefCell::new(Vec::new()),
        }
    }

    /// Serialized document as it currently stands.
    pub fn html(&self) -> String {
        self.document.borrow().html()
    }

    pub fn first(&self, selector: &str) -> Option<NodeId> {
        self.query_all(selector).into_iter().next()
    }

    /// Appends parsed markup to `parent`, as the host does when it renders
    /// new entries.
    pub fn append_html(&self, parent: NodeId, markup: &str) -> Vec<NodeId> {
        let inserted = {
            let mut document = self.document.borrow_mut();
            parse_fragment(markup)
                .into_iter()
                .filter_map(|subtree| subtree.graft(&mut document.tree, parent, false))
                .collect::<Vec<_>>()
        };
        self.emit(PageEvent::Mutated { target: parent });
        inserted
    }

    /// Replaces every child of `parent` with parsed markup.
    pub fn replace_children(&self, parent: NodeId, markup: &str) -> Vec<NodeId> {
        self.detach_children(parent);
        self.append_html(parent, markup)
    }

    /// Rebuilds the children of `parent` from scratch, the way a host
    /// framework re-renders a list: same markup, new nodes, and anything the
    /// host did not render itself (our controls) is gone.
    pub fn rerender(&self, parent: NodeId) {
        {
            let mut document = self.document.borrow_mut();
            let Some(node) = document.tree.get(parent) else {
                return;
            };
            let copies: Vec<Subtree> = node
                .children()
                .filter(|child| !is_control(*child))
                .map(|child| Subtree::capture(child, &is_control))
                .collect();
            let stale: Vec<NodeId> = node.children().map(|child| child.id()).collect();
            for id in stale {
                if let Some(mut child) = document.tree.get_mut(id) {
                    child.detach();
                }
            }
            for copy in copies {
                copy.graft(&mut document.tree, parent, false);
            }
        }
        self.emit(PageEvent::Mutated { target: parent });
    }

    pub fn remove(&self, element: NodeId) {
        let parent = self.parent(element);
        if let Some(mut node) = self.document.borrow_mut().tree.get_mut(element) {
            node.detach();
        }
        if let Some(parent) = parent {
            self.emit(PageEvent::Mutated { target: parent });
        }
    }

    /// Flips a control the way a click from the user would.
    pub fn toggle_by_user(&self, control: NodeId) {
        let checked = !self.is_checked(control);
        self.set_checked(control, checked);
        self.emit(PageEvent::ControlToggled { control });
    }

    pub fn request_delete(&self) {
        self.emit(PageEvent::DeleteRequested);
    }

    pub fn hide(&self) {
        self.emit(PageEvent::VisibilityHidden);
    }

    pub fn unload(&self) {
        self.emit(PageEvent::Unload);
    }

    /// Runs `handler` whenever an element matching `selector` is clicked.
    pub fn on_click(&self, selector: &str, handler: impl Fn(&MemoryPage, NodeId) + 'static) {
        self.click_handlers
            .borrow_mut()
            .push((selector.to_string(), Rc::new(handler)));
    }

    pub fn dispatched(&self) -> Vec<(NodeId, UiEvent)> {
        self.dispatched.borrow().clone()
    }

    pub fn matches(&self, element: NodeId, selector: &str) -> bool {
        let Some(selector) = self.selector(selector) else {
            return false;
        };
        let document = self.document.borrow();
        document
            .tree
            .get(element)
            .and_then(ElementRef::wrap)
            .is_some_and(|element| selector.matches(&element))
    }

    fn selector(&self, source: &str) -> Option<Selector> {
        self.selectors
            .borrow_mut()
            .entry(source.to_string())
            .or_insert_with(|| match Selector::parse(source) {
                Ok(selector) => Some(selector),
                Err(err) => {
                    compost_warn!("ignoring invalid selector {source:?}: {err:?}");
                    None
                }
            })
            .clone()
    }

    fn select_under(&self, scope: NodeId, source: &str, include_scope: bool) -> Vec<NodeId> {
        let Some(selector) = self.selector(source) else {
            return Vec::new();
        };
        let document = self.document.borrow();
        let Some(scope) = document.tree.get(scope) else {
            return Vec::new();
        };
        scope
            .descendants()
            .skip(usize::from(!include_scope))
            .filter_map(ElementRef::wrap)
            .filter(|element| selector.matches(element))
            .map(|element| element.id())
            .collect()
    }

    fn detach_children(&self, parent: NodeId) {
        let mut document = self.document.borrow_mut();
        let children: Vec<NodeId> = match document.tree.get(parent) {
            Some(node) => node.children().map(|child| child.id()).collect(),
            None => return,
        };
        for id in children {
            if let Some(mut child) = document.tree.get_mut(id) {
                child.detach();
            }
        }
    }

    fn emit(&self, event: PageEvent<NodeId>) {
        self.subscribers
            .borrow_mut()
            .retain(|subscriber| subscriber.send(event).is_ok());
    }
}

impl HostPage for MemoryPage {
    type Element = NodeId;

    fn query_all(&self, selector: &str) -> Vec<NodeId> {
        let root = self.document.borrow().tree.root().id();
        self.select_under(root, selector, false)
    }

    fn query_within(&self, scope: NodeId, selector: &str) -> Vec<NodeId> {
        self.select_under(scope, selector, false)
    }

    fn attribute(&self, element: NodeId, name: &str) -> Option<String> {
        let document = self.document.borrow();
        let element = document.tree.get(element).and_then(ElementRef::wrap)?;
        element.value().attr(name).map(str::to_string)
    }

    fn text_content(&self, element: NodeId) -> String {
        let document = self.document.borrow();
        document
            .tree
            .get(element)
            .and_then(ElementRef::wrap)
            .map(|element| element.text().collect())
            .unwrap_or_default()
    }

    fn parent(&self, element: NodeId) -> Option<NodeId> {
        let document = self.document.borrow();
        let parent = document.tree.get(element)?.parent()?;
        parent.value().is_element().then(|| parent.id())
    }

    fn children(&self, element: NodeId) -> Vec<NodeId> {
        let document = self.document.borrow();
        match document.tree.get(element) {
            Some(node) => node
                .children()
                .filter(|child| child.value().is_element())
                .map(|child| child.id())
                .collect(),
            None => Vec::new(),
        }
    }

    fn next_sibling(&self, element: NodeId) -> Option<NodeId> {
        let document = self.document.borrow();
        document
            .tree
            .get(element)?
            .next_siblings()
            .find(|sibling| sibling.value().is_element())
            .map(|sibling| sibling.id())
    }

    fn contains(&self, ancestor: NodeId, element: NodeId) -> bool {
        if ancestor == element {
            return true;
        }
        let document = self.document.borrow();
        document
            .tree
            .get(element)
            .is_some_and(|node| node.ancestors().any(|a| a.id() == ancestor))
    }

    fn is_connected(&self, element: NodeId) -> bool {
        let document = self.document.borrow();
        let root = document.tree.root().id();
        document
            .tree
            .get(element)
            .is_some_and(|node| node.id() == root || node.ancestors().any(|a| a.id() == root))
    }

    fn insert_control(&self, item: NodeId) -> Option<NodeId> {
        let template = self.control_template.clone()?;
        let control = {
            let mut document = self.document.borrow_mut();
            let mut node = document.tree.get_mut(item)?;
            node.prepend(template).id()
        };
        self.emit(PageEvent::Mutated { target: item });
        Some(control)
    }

    fn is_checked(&self, control: NodeId) -> bool {
        self.checked.borrow().contains(&control)
    }

    fn set_checked(&self, control: NodeId, checked: bool) {
        let mut set = self.checked.borrow_mut();
        if checked {
            set.insert(control);
        } else {
            set.remove(&control);
        }
    }

    fn mark_removed(&self, item: NodeId) {
        self.removed.borrow_mut().insert(item);
    }

    fn is_marked_removed(&self, item: NodeId) -> bool {
        self.removed.borrow().contains(&item)
    }

    fn dispatch(&self, element: NodeId, event: UiEvent) {
        self.dispatched.borrow_mut().push((element, event));
        if event != UiEvent::Click {
            return;
        }
        let handlers: Vec<ClickHandler> = self
            .click_handlers
            .borrow()
            .iter()
            .filter(|(selector, _)| self.matches(element, selector))
            .map(|(_, handler)| handler.clone())
            .collect();
        for handler in handlers {
            handler(self, element);
        }
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<PageEvent<NodeId>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.borrow_mut().push(tx);
        rx
    }

    fn remove_control(&self, item: NodeId) {
        let Some(control) = self.control_of(item) else {
            return;
        };
        if let Some(mut node) = self.document.borrow_mut().tree.get_mut(control) {
            node.detach();
        }
        self.checked.borrow_mut().remove(&control);
        self.emit(PageEvent::Mutated { target: item });
    }
}

/// Surface that answers confirmations with a fixed answer and records
/// everything else.
pub struct RecordingSurface {
    answer: Cell<bool>,
    confirmations: RefCell<Vec<String>>,
    alerts: RefCell<Vec<String>>,
    counts: RefCell<Vec<usize>>,
    progress: RefCell<Vec<(usize, usize)>>,
    reloads: RefCell<Vec<Duration>>,
}

impl RecordingSurface {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer: Cell::new(answer),
            confirmations: RefCell::new(Vec::new()),
            alerts: RefCell::new(Vec::new()),
            counts: RefCell::new(Vec::new()),
            progress: RefCell::new(Vec::new()),
            reloads: RefCell::new(Vec::new()),
        }
    }

    pub fn set_answer(&self, answer: bool) {
        self.answer.set(answer);
    }

    pub fn confirmations(&self) -> Vec<String> {
        self.confirmations.borrow().clone()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.borrow().clone()
    }

    pub fn last_count(&self) -> Option<usize> {
        self.counts.borrow().last().copied()
    }

    pub fn progress(&self) -> Vec<(usize, usize)> {
        self.progress.borrow().clone()
    }

    pub fn reloads(&self) -> Vec<Duration> {
        self.reloads.borrow().clone()
    }
}

impl HostSurface for RecordingSurface {
    fn confirm(&self, message: &str) -> bool {
        self.confirmations.borrow_mut().push(message.to_string());
        self.answer.get()
    }

    fn alert(&self, message: &str) {
        compost_info!("alert: {message}");
        self.alerts.borrow_mut().push(message.to_string());
    }

    fn show_selected_count(&self, count: usize) {
        self.counts.borrow_mut().push(count);
    }

    fn show_progress(&self, current: usize, total: usize) {
        self.progress.borrow_mut().push((current, total));
    }

    fn schedule_reload(&self, delay: Duration) {
        self.reloads.borrow_mut().push(delay);
    }
}
