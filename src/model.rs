// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 模型
//!
//! `Model` 是绑定到一张数据表上的链式 SQL 构建器，同时承担活动记录的职责。
//!
//! ## 状态
//! - 初始：组件为默认值，表名为 `前缀 + 表名`。
//! - 累积：链式方法逐步填充组件与绑定参数（fields 阶段与 where 阶段）。
//! - 终结：`select`/`insert`/`update`/`delete`/`exec`/`query` 消费累积的状态，
//!   无论成功与否都会重置回初始状态。
//!
//! ## 示例
//! ```ignore
//! let rows = Model::new(&mut dao, TableDef::new("article").prefix("blg_"))
//!     .alias("a")
//!     .inner_join("{{article_tag}} t on t.aid = a.aid")
//!     .where_clause(Segments::new().eq("a.author", "tom"))
//!     .order("a.aid DESC")
//!     .limit(10, 0)
//!     .select()?;
//! ```

use std::collections::BTreeMap;

use log::{debug, info, warn};
use serde_json::Value;

use crate::dao::{Dao, Driver, Row};
use crate::exception::Exception;
use crate::query::{
    BindParams, Condition, Connective, FieldSpec, JoinKind, QueryComponents, Segments,
};

/// 数据表定义：表名、表前缀与主键
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
    name: String,
    prefix: String,
    pk: String,
}

impl TableDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: String::new(),
            pk: "id".to_string(),
        }
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn pk(mut self, pk: impl Into<String>) -> Self {
        self.pk = pk.into();
        self
    }

    /// 带前缀的完整表名；表名中含 `{{x}}` 占位符时以占位符替换代替直接拼接
    pub fn table(&self) -> String {
        if self.name.contains("{{") {
            self.replace_prefix(&self.name)
        } else {
            format!("{}{}", self.prefix, self.name)
        }
    }

    pub fn primary_key(&self) -> &str {
        &self.pk
    }

    fn replace_prefix(&self, text: &str) -> String {
        if text.contains("{{") {
            text.replace("{{", &self.prefix).replace("}}", "")
        } else {
            text.to_string()
        }
    }
}

/// 按阶段记录的命名绑定参数
#[derive(Debug, Clone, Default)]
struct PhaseBinds {
    /// `fields` 设置的字段值，供 insert/update 使用
    fields: Row,
    /// `where_clause` 翻译出的绑定参数，select 只使用这一阶段
    where_clause: BTreeMap<String, Value>,
}

pub struct Model<'a, D: Driver> {
    dao: &'a mut Dao<D>,
    def: TableDef,
    components: QueryComponents,
    binds: PhaseBinds,
    id: Option<Value>,
    data: Row,
}

impl<'a, D: Driver> Model<'a, D> {
    pub fn new(dao: &'a mut Dao<D>, def: TableDef) -> Self {
        let mut model = Self {
            dao,
            def,
            components: QueryComponents::default(),
            binds: PhaseBinds::default(),
            id: None,
            data: Row::new(),
        };
        model.reset();
        model
    }

    /// 按主键载入一条记录，记录不存在时返回 `RecordNotFound`
    pub fn load(dao: &'a mut Dao<D>, def: TableDef, pk: impl Into<Value>) -> Result<Self, Exception> {
        let pk = pk.into();
        let mut model = Self::new(dao, def);
        match model.find_by_pk(pk.clone())? {
            Some(data) => {
                model.id = Some(data.get(model.def.primary_key()).cloned().unwrap_or(pk));
                model.data = data;
                Ok(model)
            }
            None => Err(Exception::RecordNotFound(format!("ID '{}' not found", pk))),
        }
    }

    /// 回到初始状态，表名恢复为模型的表
    pub fn reset(&mut self) -> &mut Self {
        self.components = QueryComponents {
            table: self.def.table(),
            ..QueryComponents::default()
        };
        self.binds = PhaseBinds::default();
        self
    }

    pub fn def(&self) -> &TableDef {
        &self.def
    }

    pub fn components(&self) -> &QueryComponents {
        &self.components
    }

    pub fn dao(&self) -> &Dao<D> {
        &*self.dao
    }
}

// --- 链式方法 ---

impl<'a, D: Driver> Model<'a, D> {
    pub fn distinct(&mut self, distinct: bool) -> &mut Self {
        self.components.distinct = distinct;
        self
    }

    /// 设置查询字段；`FieldSpec::Values` 同时为 insert/update 记录字段值
    pub fn fields(&mut self, fields: impl Into<FieldSpec>) -> &mut Self {
        self.components.fields = match fields.into() {
            FieldSpec::All => "*".to_string(),
            FieldSpec::Raw(raw) => raw,
            FieldSpec::List(list) => list
                .iter()
                .map(|field| self.dao.escape(field.trim()))
                .collect::<Vec<_>>()
                .join(","),
            FieldSpec::Values(values) => {
                let keys = values
                    .iter()
                    .map(|(field, _)| self.dao.escape(field))
                    .collect::<Vec<_>>()
                    .join(",");
                self.binds.fields = values.into_iter().collect();
                keys
            }
        };
        self
    }

    pub fn table(&mut self, table: &str) -> &mut Self {
        self.components.table = self.def.replace_prefix(table);
        self
    }

    pub fn alias(&mut self, alias: &str) -> &mut Self {
        self.components.table = format!("{} {}", self.components.table, alias);
        self
    }

    pub fn join(&mut self, join: &str, kind: JoinKind) -> &mut Self {
        let join = self.def.replace_prefix(&kind.render(join));
        self.components.joins.push(join);
        self
    }

    pub fn inner_join(&mut self, join: &str) -> &mut Self {
        self.join(join, JoinKind::Inner)
    }

    pub fn left_outer_join(&mut self, join: &str) -> &mut Self {
        self.join(join, JoinKind::LeftOuter)
    }

    /// 设置 WHERE 条件，片段之间以 AND 连接；where 阶段的绑定参数随之替换
    pub fn where_clause(&mut self, condition: impl Into<Condition>) -> &mut Self {
        let (sql, bind) = condition.into().resolve(self.dao.dialect(), Connective::And);
        self.components.where_clause = Some(sql);
        self.binds.where_clause = bind;
        self
    }

    pub fn group(&mut self, group: &str) -> &mut Self {
        self.components.group = Some(group.to_string());
        self
    }

    pub fn order(&mut self, order: &str) -> &mut Self {
        self.components.order = Some(order.to_string());
        self
    }

    pub fn having(&mut self, having: &str) -> &mut Self {
        self.components.having = Some(having.to_string());
        self
    }

    pub fn limit(&mut self, limit: u64, offset: u64) -> &mut Self {
        self.components.limit = Some(limit);
        self.components.offset = Some(offset);
        self
    }
}

// --- 终结操作 ---

impl<'a, D: Driver> Model<'a, D> {
    /// 编译当前组件，不改变状态
    pub fn compile(&self) -> String {
        self.dao.compile(&self.components)
    }

    /// 执行 SELECT，只绑定 where 阶段的参数
    pub fn select(&mut self) -> Result<Vec<Row>, Exception> {
        let sql = self.compile();
        let bind = BindParams::named(std::mem::take(&mut self.binds.where_clause));
        self.query(&sql, bind)
    }

    /// 按条件查找第一条记录；`None` 时使用已累积的条件
    pub fn find(&mut self, keys: Option<Segments>) -> Result<Option<Row>, Exception> {
        if let Some(keys) = keys {
            self.where_clause(keys);
        }
        Ok(self.select()?.into_iter().next())
    }

    pub fn find_by_pk(&mut self, id: impl Into<Value>) -> Result<Option<Row>, Exception> {
        let keys = Segments::new().eq(self.def.primary_key(), id);
        self.find(Some(keys))
    }

    pub fn find_all(&mut self, keys: Option<Segments>) -> Result<Vec<Row>, Exception> {
        if let Some(keys) = keys {
            self.where_clause(keys);
        }
        self.select()
    }

    /// 满足当前条件的记录数
    pub fn count(&mut self) -> Result<u64, Exception> {
        self.components.fields = "count(*) AS c".to_string();
        let rows = self.select()?;
        let count = rows.first().and_then(|row| row.get("c")).and_then(|c| match c {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        });
        count.ok_or_else(|| Exception::Database("count result is missing".to_string()))
    }

    /// 插入一条记录，字段按键序以 `?` 位置参数绑定；`None` 时使用 fields 阶段记录的字段值
    pub fn insert(&mut self, data: Option<&Row>) -> Result<u64, Exception> {
        let data = match data {
            Some(data) => data.clone(),
            None => std::mem::take(&mut self.binds.fields),
        };
        if data.is_empty() {
            self.reset();
            return Err(Exception::Database("insert data should not be empty".to_string()));
        }

        let table = self.write_table();
        let fields = data
            .keys()
            .map(|field| self.dao.escape(field))
            .collect::<Vec<_>>()
            .join(",");
        let holders = vec!["?"; data.len()].join(",");
        let sql = format!("INSERT INTO {} ( {} ) VALUES ( {} );", table, fields, holders);
        let values = data.into_iter().map(|(_, value)| value).collect();
        self.exec(&sql, BindParams::Positional(values))
    }

    /// 更新记录；字段以逗号连接，条件以 AND 连接，二者的绑定参数合并（条件优先）
    pub fn update(
        &mut self,
        fields: Option<Condition>,
        where_clause: Option<Condition>,
    ) -> Result<u64, Exception> {
        let dialect = self.dao.dialect();
        let fields = match fields {
            Some(fields) => fields,
            None if !self.binds.fields.is_empty() => {
                let values = std::mem::take(&mut self.binds.fields);
                Condition::Segments(values.into_iter().collect())
            }
            None => {
                self.reset();
                return Err(Exception::Database("fields should not be empty".to_string()));
            }
        };
        let (set, mut bind) = fields.resolve(dialect, Connective::Comma);

        let (condition, where_bind) = match where_clause {
            Some(condition) => condition.resolve(dialect, Connective::And),
            None => self.pending_where(),
        };
        if set.is_empty() || condition.is_empty() {
            self.reset();
            return Err(Exception::Database(
                "fields and where should not be empty".to_string(),
            ));
        }
        bind.extend(where_bind);

        let sql = format!("UPDATE {} SET {} WHERE {};", self.write_table(), set, condition);
        self.exec(&sql, BindParams::named(bind))
    }

    /// 删除记录，WHERE 不能为空
    pub fn delete(&mut self, where_clause: Option<Condition>) -> Result<u64, Exception> {
        let (condition, bind) = match where_clause {
            Some(condition) => condition.resolve(self.dao.dialect(), Connective::And),
            None => self.pending_where(),
        };
        if condition.is_empty() {
            self.reset();
            return Err(Exception::Database("where should not be empty".to_string()));
        }

        let sql = format!("DELETE FROM {} WHERE {};", self.write_table(), condition);
        self.exec(&sql, BindParams::named(bind))
    }

    /// 直接执行语句，执行后重置
    pub fn exec(&mut self, sql: &str, bind: BindParams) -> Result<u64, Exception> {
        let result = self.dao.exec(sql, bind);
        self.reset();
        result
    }

    /// 直接执行查询，执行后重置
    pub fn query(&mut self, sql: &str, bind: BindParams) -> Result<Vec<Row>, Exception> {
        let result = self.dao.query(sql, bind);
        self.reset();
        result
    }

    fn pending_where(&mut self) -> (String, BTreeMap<String, Value>) {
        let condition = self
            .components
            .where_clause
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        (condition, std::mem::take(&mut self.binds.where_clause))
    }

    /// 写操作使用的表名，带别名（含空白）时不转义
    fn write_table(&self) -> String {
        let table = if self.components.table.trim().is_empty() {
            self.def.table()
        } else {
            self.components.table.trim().to_string()
        };
        if table.contains(char::is_whitespace) {
            table
        } else {
            self.dao.escape(&table)
        }
    }
}

// --- 活动记录 ---

impl<'a, D: Driver> Model<'a, D> {
    pub fn id(&self) -> Option<&Value> {
        self.id.as_ref()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        self.data.insert(name.to_string(), value.into());
        self
    }

    pub fn data(&self) -> &Row {
        &self.data
    }

    pub fn clear(&mut self) -> &mut Self {
        self.id = None;
        self.data.clear();
        self
    }

    /// 按主键重新读取数据
    pub fn reload(&mut self) -> Result<&mut Self, Exception> {
        let id = self
            .id
            .clone()
            .ok_or_else(|| Exception::RecordNotFound("id not specified".to_string()))?;
        match self.find_by_pk(id.clone())? {
            Some(data) => {
                self.data = data;
                Ok(self)
            }
            None => Err(Exception::RecordNotFound(format!("ID '{}' not found", id))),
        }
    }

    /// 保存数据：主键已知时更新，否则插入并取回新主键
    pub fn save(&mut self, just_insert: bool) -> Result<(), Exception> {
        let pk = self.def.primary_key().to_string();
        self.data.remove(&pk);
        let data = self.data.clone();

        match self.id.clone() {
            Some(id) if !just_insert => {
                let fields: Segments = data.into_iter().collect();
                self.update(Some(fields.into()), Some(Segments::new().eq(pk, id).into()))?;
            }
            _ => {
                self.insert(Some(&data))?;
                self.id = Some(self.dao.last_insert_id()?);
            }
        }
        debug!("记录已保存：{} {:?}", self.def.table(), self.id);
        self.reload()?;
        Ok(())
    }

    /// 删除当前记录；没有主键或记录已不存在时返回 `false`
    pub fn remove(&mut self) -> Result<bool, Exception> {
        let id = match self.id.clone() {
            Some(id) => id,
            None => return Ok(false),
        };
        match self.reload() {
            Ok(_) => {}
            Err(Exception::RecordNotFound(reason)) => {
                warn!("待删除的记录不存在：{} {}", self.def.table(), reason);
                self.data.clear();
                return Ok(false);
            }
            Err(e) => return Err(e),
        }
        info!("删除记录：{} {} {}", self.def.table(), id, Value::Object(self.data.clone()));
        let keys = Segments::new().eq(self.def.primary_key(), id);
        Ok(self.delete(Some(keys.into()))? > 0)
    }
}
