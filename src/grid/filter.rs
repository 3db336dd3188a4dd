//! Filter pipeline (过滤管道)

use sqlx::{Postgres, QueryBuilder};

/// 过滤条件运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Like,
    Gte,
    Lte,
}

impl FilterOp {
    fn sql(self) -> &'static str {
        match self {
            FilterOp::Eq => " = ",
            FilterOp::Like => " LIKE ",
            FilterOp::Gte => " >= ",
            FilterOp::Lte => " <= ",
        }
    }
}

/// 可过滤列的白名单；Content 变体指向 JSONB 内容的顶层键
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordColumn {
    EntityType,
    CreatedAt,
    Content(String),
}

/// 抽象过滤条件：(列, 运算符, 值)
#[derive(Debug, Clone)]
pub struct FilterCriteria {
    pub column: RecordColumn,
    pub op: FilterOp,
    pub value: String,
}

impl FilterCriteria {
    pub fn new(column: RecordColumn, op: FilterOp, value: impl Into<String>) -> Self {
        Self {
            column,
            op,
            value: value.into(),
        }
    }
}

/// 查询过滤器：以抽象条件声明自身的筛选逻辑
pub trait QueryFilter: Send + Sync {
    /// 过滤器名称（用于日志）
    fn name(&self) -> &str;

    /// 声明过滤条件
    fn criteria(&self) -> Vec<FilterCriteria>;
}

/// 按序将过滤器折叠进查询的 WHERE 子句
pub struct FilterPipeline {
    filters: Vec<Box<dyn QueryFilter>>,
}

impl FilterPipeline {
    pub fn new(filters: Vec<Box<dyn QueryFilter>>) -> Self {
        Self { filters }
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// 应用全部过滤器；列名来自白名单，值一律参数绑定
    pub fn apply(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        for filter in &self.filters {
            let criteria = filter.criteria();
            tracing::debug!(filter = filter.name(), conditions = criteria.len(), "Applying filter");

            for criterion in criteria {
                match &criterion.column {
                    RecordColumn::EntityType => {
                        qb.push(" AND entity_type");
                        qb.push(criterion.op.sql());
                        qb.push_bind(criterion.value.clone());
                    }
                    RecordColumn::CreatedAt => {
                        qb.push(" AND created_at");
                        qb.push(criterion.op.sql());
                        qb.push_bind(criterion.value.clone());
                        qb.push("::timestamptz");
                    }
                    RecordColumn::Content(key) => {
                        qb.push(" AND content->>");
                        qb.push_bind(key.clone());
                        qb.push(criterion.op.sql());
                        qb.push_bind(criterion.value.clone());
                    }
                }
            }
        }
    }
}
