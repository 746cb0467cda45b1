//! # Marketplace Processors
//!
//! | Method | Processor | Parts |
//! |--------|-----------|-------|
//! | `profile.get` | [`ProfileProcessor`] | 1 |
//! | `account.summary` | [`AccountProcessor`] | 1 |
//! | `orders.list` | [`OrdersProcessor`] | one per page |
//! | `deals.list` | [`DealsProcessor`] | one per page |

pub mod catalog;
mod deals;
mod orders;
mod profiles;

pub use catalog::Catalog;
pub use deals::DealsProcessor;
pub use orders::OrdersProcessor;
pub use profiles::{AccountProcessor, ProfileProcessor};

use mc_02_router::{ProcessorRegistry, Produced, RegistryError};
use shared_types::{AccountSummary, CallResult, GetProfile, ListDeals, ListOrders, Page};
use std::collections::VecDeque;
use std::sync::Arc;

/// Registry serving every marketplace method from `catalog`.
pub fn build_registry(
    catalog: Arc<Catalog>,
    page_size: usize,
) -> Result<ProcessorRegistry, RegistryError> {
    let mut registry = ProcessorRegistry::new();
    registry.register_method::<GetProfile, _>(ProfileProcessor::new(Arc::clone(&catalog)))?;
    registry.register_method::<AccountSummary, _>(AccountProcessor::new(Arc::clone(&catalog)))?;
    registry.register_method::<ListOrders, _>(OrdersProcessor::new(
        Arc::clone(&catalog),
        page_size,
    ))?;
    registry.register_method::<ListDeals, _>(DealsProcessor::new(catalog, page_size))?;
    Ok(registry)
}

/// Split `items` into pages, emitting one page per step.
///
/// An empty listing still yields a single (empty, last) page.
pub(crate) fn paginate<T>(items: Vec<T>, page_size: usize) -> Produced<Page<T>>
where
    T: Send + 'static,
{
    let total = items.len();
    let page_size = page_size.max(1);

    let mut pages = VecDeque::new();
    let mut current = Vec::with_capacity(page_size);
    for item in items {
        current.push(item);
        if current.len() == page_size {
            pages.push_back(std::mem::replace(
                &mut current,
                Vec::with_capacity(page_size),
            ));
        }
    }
    if !current.is_empty() || pages.is_empty() {
        pages.push_back(current);
    }

    next_page(pages, 0, total)
}

fn next_page<T>(mut rest: VecDeque<Vec<T>>, index: u32, total: usize) -> Produced<Page<T>>
where
    T: Send + 'static,
{
    let items = rest.pop_front().unwrap_or_default();
    let last = rest.is_empty();
    let page = Page {
        items,
        page: index,
        total,
        last,
    };

    if last {
        Produced::last_data(page)
    } else {
        Produced::more(CallResult::data(page), async move {
            Ok(next_page(rest, index + 1, total))
        })
    }
}
