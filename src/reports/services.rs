use crate::error::{AppError, AppResult};
use crate::reports::dto::DashboardStats;
use crate::store::InventoryStore;

/// `ceil(total / page_size)`; zero matches means zero pages.
pub fn total_pages(total: i64, page_size: i64) -> i64 {
    if total <= 0 || page_size <= 0 {
        return 0;
    }
    (total + page_size - 1) / page_size
}

/// Offset of a 1-based page.
pub fn page_offset(page: i64, page_size: i64) -> AppResult<i64> {
    if page < 1 {
        return Err(AppError::validation("page must be 1 or greater"));
    }
    (page - 1)
        .checked_mul(page_size)
        .ok_or_else(|| AppError::validation("page is out of range"))
}

pub async fn dashboard(store: &dyn InventoryStore, include_admins: bool) -> AppResult<DashboardStats> {
    let (total_users, total_products, low_stock_products, total_sales_count, total_sales_amount) =
        tokio::try_join!(
            store.count_users(include_admins),
            store.count_products(),
            store.count_low_stock(),
            store.count_sales(),
            store.total_sales_amount(),
        )?;
    Ok(DashboardStats {
        total_users,
        total_products,
        low_stock_products,
        total_sales_count,
        total_sales_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(1, 20), 1);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
        assert_eq!(total_pages(45, 20), 3);
    }

    #[test]
    fn page_offset_is_one_based() {
        assert_eq!(page_offset(1, 20).unwrap(), 0);
        assert_eq!(page_offset(3, 20).unwrap(), 40);
        assert!(matches!(page_offset(0, 20), Err(AppError::Validation(_))));
        assert!(page_offset(i64::MAX, 20).is_err());
    }
}
