use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;

use tokio::sync::mpsc;

/// Class carried by every selection control we inject.
pub const CONTROL_CLASS: &str = "compost-checkbox";

/// Query matching injected selection controls.
pub const CONTROL_SELECTOR: &str = "input.compost-checkbox";

/// Something that happened on the page, delivered to every subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent<E> {
    /// Nodes were inserted or removed under `target`.
    Mutated { target: E },
    /// The user flipped a selection control.
    ControlToggled { control: E },
    /// The floating delete button was pressed.
    DeleteRequested,
    /// The tab went to the background.
    VisibilityHidden,
    /// The page is going away.
    Unload,
}

/// Synthetic input dispatched by the scripted deletion strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    Hover,
    Click,
}

/// The host document as the reconciler and the strategies see it.
///
/// Queries take CSS selectors; `query_*` never return detached elements.
/// Programmatic `set_checked` does not emit [`PageEvent::ControlToggled`],
/// only a user toggle does.
pub trait HostPage {
    type Element: Copy + Eq + Hash + Debug + 'static;

    fn query_all(&self, selector: &str) -> Vec<Self::Element>;
    /// Matching descendants of `scope`, excluding `scope` itself.
    fn query_within(&self, scope: Self::Element, selector: &str) -> Vec<Self::Element>;

    fn attribute(&self, element: Self::Element, name: &str) -> Option<String>;
    fn text_content(&self, element: Self::Element) -> String;
    fn parent(&self, element: Self::Element) -> Option<Self::Element>;
    /// Element children, in document order.
    fn children(&self, element: Self::Element) -> Vec<Self::Element>;
    fn next_sibling(&self, element: Self::Element) -> Option<Self::Element>;
    /// Whether `element` is `ancestor` or lies inside it.
    fn contains(&self, ancestor: Self::Element, element: Self::Element) -> bool;
    fn is_connected(&self, element: Self::Element) -> bool;

    /// Prepends a fresh, unchecked selection control to `item`.
    fn insert_control(&self, item: Self::Element) -> Option<Self::Element>;
    fn is_checked(&self, control: Self::Element) -> bool;
    fn set_checked(&self, control: Self::Element, checked: bool);

    /// Dims the item and makes it non-interactive without detaching it.
    fn mark_removed(&self, item: Self::Element);
    fn is_marked_removed(&self, item: Self::Element) -> bool;

    fn dispatch(&self, element: Self::Element, event: UiEvent);
    fn subscribe(&self) -> mpsc::UnboundedReceiver<PageEvent<Self::Element>>;

    /// The control injected into `item`, if any.
    fn control_of(&self, item: Self::Element) -> Option<Self::Element> {
        self.query_within(item, CONTROL_SELECTOR).into_iter().next()
    }

    fn remove_control(&self, item: Self::Element);

    /// The item a control was injected into.
    fn item_of(&self, control: Self::Element) -> Option<Self::Element> {
        self.parent(control)
    }

    fn mounted_controls(&self) -> Vec<Self::Element> {
        self.query_all(CONTROL_SELECTOR)
    }

    fn checked_controls(&self) -> Vec<Self::Element> {
        self.mounted_controls()
            .into_iter()
            .filter(|control| self.is_checked(*control))
            .collect()
    }
}

/// Browser chrome around the page: dialogs, the floating button, reloads.
pub trait HostSurface {
    /// Blocking yes/no question.
    fn confirm(&self, message: &str) -> bool;
    fn alert(&self, message: &str);
    /// Refreshes the floating button; it is enabled only when `count > 0`.
    fn show_selected_count(&self, count: usize);
    fn show_progress(&self, current: usize, total: usize);
    fn schedule_reload(&self, delay: Duration);
}
