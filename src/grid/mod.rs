//! 实体网格
//! 对内容实体类型的分页过滤列表：实体定义声明过滤器，管道按序应用后分页

pub mod filter;
pub mod pagination;

pub use filter::{FilterCriteria, FilterOp, FilterPipeline, QueryFilter, RecordColumn};
pub use pagination::Page;

use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::config::GridConfig;
use crate::error::AccessError;
use crate::models::record::Record;

/// 过滤器构造器：以所属实体定义为参数实例化过滤器
pub type FilterFactory<E> = fn(&E) -> Box<dyn QueryFilter>;

/// 内容实体类型定义
pub trait EntityDefinition: Send + Sync + Sized {
    /// 实体类型标识
    fn slug(&self) -> &str;

    /// 适用于该实体的过滤器构造器（按应用顺序）
    fn filters(&self) -> Vec<FilterFactory<Self>> {
        Vec::new()
    }

    /// 实例化全部过滤器，每个过滤器持有所属实体定义的状态
    fn get_filters(&self) -> Vec<Box<dyn QueryFilter>> {
        self.filters().into_iter().map(|make| make(self)).collect()
    }
}

/// 实体记录的分页过滤列表
pub struct EntityGrid<E: EntityDefinition> {
    entity: E,
    per_page: i64,
}

impl<E: EntityDefinition> EntityGrid<E> {
    pub fn new(entity: E, config: &GridConfig) -> Self {
        Self {
            entity,
            per_page: config.per_page,
        }
    }

    pub fn entity(&self) -> &E {
        &self.entity
    }

    /// 构建当前页的记录查询；记录按 id 倒序
    pub fn query(&self, page: u32) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(
            "SELECT id, entity_type, content, created_at FROM records WHERE entity_type = ",
        );
        qb.push_bind(self.entity.slug().to_string());

        FilterPipeline::new(self.entity.get_filters()).apply(&mut qb);

        let offset = (i64::from(page.max(1)) - 1) * self.per_page;
        qb.push(" ORDER BY id DESC LIMIT ");
        qb.push_bind(self.per_page);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        qb
    }

    /// 构建与记录查询同条件的计数查询
    pub fn count_query(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM records WHERE entity_type = ");
        qb.push_bind(self.entity.slug().to_string());

        FilterPipeline::new(self.entity.get_filters()).apply(&mut qb);

        qb
    }

    /// 获取一页记录
    pub async fn get(&self, pool: &PgPool, page: u32) -> Result<Page<Record>, AccessError> {
        let page = page.max(1);

        let mut query = self.query(page);
        let items = query.build_query_as::<Record>().fetch_all(pool).await?;

        let mut count_query = self.count_query();
        let total: i64 = count_query.build_query_scalar().fetch_one(pool).await?;

        Ok(Page::new(items, page, self.per_page, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridConfig;

    struct PostEntity {
        status: String,
    }

    struct StatusFilter {
        status: String,
    }

    impl QueryFilter for StatusFilter {
        fn name(&self) -> &str {
            "status"
        }

        fn criteria(&self) -> Vec<FilterCriteria> {
            vec![FilterCriteria::new(
                RecordColumn::Content("status".to_string()),
                FilterOp::Eq,
                self.status.clone(),
            )]
        }
    }

    impl EntityDefinition for PostEntity {
        fn slug(&self) -> &str {
            "post"
        }

        fn filters(&self) -> Vec<FilterFactory<Self>> {
            vec![|entity| {
                Box::new(StatusFilter {
                    status: entity.status.clone(),
                })
            }]
        }
    }

    fn grid() -> EntityGrid<PostEntity> {
        EntityGrid::new(
            PostEntity {
                status: "published".to_string(),
            },
            &GridConfig { per_page: 15 },
        )
    }

    #[test]
    fn test_get_filters_instantiates_with_entity_state() {
        let entity = PostEntity {
            status: "draft".to_string(),
        };

        let filters = entity.get_filters();
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].criteria()[0].value, "draft");
    }

    #[test]
    fn test_query_applies_filters_and_pagination() {
        let mut query = grid().query(2);
        let sql = query.sql();

        assert!(sql.starts_with("SELECT id, entity_type, content, created_at FROM records"));
        assert!(sql.contains("WHERE entity_type = $1"));
        assert!(sql.contains("content->>$2 = $3"));
        assert!(sql.contains("ORDER BY id DESC LIMIT $4 OFFSET $5"));
    }

    #[test]
    fn test_count_query_shares_filter_conditions() {
        let mut query = grid().count_query();
        let sql = query.sql();

        assert!(sql.starts_with("SELECT COUNT(*) FROM records"));
        assert!(sql.contains("content->>$2 = $3"));
        assert!(!sql.contains("ORDER BY"));
        assert!(!sql.contains("LIMIT"));
    }

    #[test]
    fn test_page_zero_is_treated_as_first_page() {
        let mut first = grid().query(1);
        let mut zero = grid().query(0);

        assert_eq!(first.sql(), zero.sql());
    }
}
