//! Page-link widget rules of the registry listing
//!
//! The widget shows a sliding window of numbered links plus a "next" control.
//! When no page follows the current one, the position right after the current
//! page's link renders as a static label instead of a link, which is what the
//! last-page check looks for.

use crate::crawler::traits::{LinkSlot, PageTarget, PageWindow};

/// Position of the "next page" control
pub const NEXT_CONTROL_SLOT: usize = 7;

/// Position the window settles at once the current page is centred
const CENTRED_SLOT: usize = 5;

/// Position right after the current page's link
///
/// For the first five pages this is `page + 2`. After that the window slides
/// and the position stays at 6.
fn following_slot(page: u32) -> usize {
    if page <= 5 {
        page as usize + 2
    } else {
        6
    }
}

/// Returns true if the current page is the last one
///
/// The page is last when the position right after its link is rendered as a
/// label. A window without that position is not a last page.
pub fn is_last_page(window: &PageWindow, page: u32) -> bool {
    matches!(window.slot(following_slot(page)), Some(LinkSlot::Label))
}

/// Control leading from `page` to the page after it
///
/// For result totals of 201 to 300 the numbered link to the next page does not
/// exist on pages 4 and 5 respectively, and the "next" control is used
/// instead.
pub fn next_page_target(total_items: Option<u32>, page: u32) -> PageTarget {
    let total = total_items.unwrap_or(0);
    if (201..=250).contains(&total) && page == 4 || (251..=300).contains(&total) && page == 5 {
        PageTarget::NextControl {
            slot: NEXT_CONTROL_SLOT,
        }
    } else if page < 4 {
        PageTarget::Numbered {
            slot: page as usize + 2,
        }
    } else {
        PageTarget::Numbered { slot: CENTRED_SLOT }
    }
}
