//! 菜单与路由树

use std::collections::{BTreeMap, HashMap, HashSet};

use iam_common::{EnableStatus, MenuId};
use serde::Serialize;

/// 顶级菜单的父 ID
pub const ROOT_MENU_ID: MenuId = MenuId(0);

/// 菜单类型（1 目录，2 菜单，3 按钮）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MenuType {
    Dir,
    Menu,
    Button,
}

impl MenuType {
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(Self::Dir),
            2 => Some(Self::Menu),
            3 => Some(Self::Button),
            _ => None,
        }
    }
}

/// 菜单
#[derive(Debug, Clone)]
pub struct Menu {
    pub id: MenuId,
    pub parent_id: MenuId,
    pub title: String,
    pub menu_type: MenuType,
    pub path: Option<String>,
    pub name: Option<String>,
    pub component: Option<String>,
    pub redirect: Option<String>,
    pub icon: Option<String>,
    pub is_external: bool,
    pub is_cache: bool,
    pub is_hidden: bool,
    /// 权限码，例如 `system:user:list`
    pub permission: Option<String>,
    pub sort: i32,
    pub status: EnableStatus,
}

impl Menu {
    pub fn is_enabled(&self) -> bool {
        self.status.is_enabled()
    }

    /// 非空白的权限码
    pub fn permission_code(&self) -> Option<&str> {
        self.permission
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

/// 路由树节点（前端渲染用）
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteNode {
    pub id: MenuId,
    pub parent_id: MenuId,
    pub title: String,
    #[serde(rename = "type")]
    pub menu_type: MenuType,
    pub path: Option<String>,
    pub name: Option<String>,
    pub component: Option<String>,
    pub redirect: Option<String>,
    pub icon: Option<String>,
    pub is_external: bool,
    pub is_cache: bool,
    pub is_hidden: bool,
    pub sort: i32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RouteNode>,
}

impl From<&Menu> for RouteNode {
    fn from(menu: &Menu) -> Self {
        Self {
            id: menu.id,
            parent_id: menu.parent_id,
            title: menu.title.clone(),
            menu_type: menu.menu_type,
            path: menu.path.clone(),
            name: menu.name.clone(),
            component: menu.component.clone(),
            redirect: menu.redirect.clone(),
            icon: menu.icon.clone(),
            is_external: menu.is_external,
            is_cache: menu.is_cache,
            is_hidden: menu.is_hidden,
            sort: menu.sort,
            children: Vec::new(),
        }
    }
}

/// 按父 ID 组装路由树
///
/// - 相同 ID 只保留一份
/// - 同级按 (sort, id) 升序
/// - 父节点不在集合中的条目提升为根节点
/// - 成环的条目没有可达的根，不会出现在结果中
pub fn build_route_tree<'a>(menus: impl IntoIterator<Item = &'a Menu>) -> Vec<RouteNode> {
    let unique: BTreeMap<MenuId, &Menu> = menus.into_iter().map(|m| (m.id, m)).collect();

    let mut roots: Vec<&Menu> = Vec::new();
    let mut children: HashMap<MenuId, Vec<&Menu>> = HashMap::new();
    for menu in unique.values() {
        if menu.parent_id == ROOT_MENU_ID
            || menu.parent_id == menu.id
            || !unique.contains_key(&menu.parent_id)
        {
            roots.push(menu);
        } else {
            children.entry(menu.parent_id).or_default().push(menu);
        }
    }

    let mut visited = HashSet::new();
    sort_siblings(&mut roots);
    roots
        .into_iter()
        .filter_map(|m| attach(m, &children, &mut visited))
        .collect()
}

fn attach(
    menu: &Menu,
    children: &HashMap<MenuId, Vec<&Menu>>,
    visited: &mut HashSet<MenuId>,
) -> Option<RouteNode> {
    if !visited.insert(menu.id) {
        return None;
    }
    let mut node = RouteNode::from(menu);
    if let Some(kids) = children.get(&menu.id) {
        let mut kids = kids.clone();
        sort_siblings(&mut kids);
        node.children = kids
            .into_iter()
            .filter_map(|k| attach(k, children, visited))
            .collect();
    }
    Some(node)
}

fn sort_siblings(menus: &mut [&Menu]) {
    menus.sort_by_key(|m| (m.sort, m.id));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu(id: i64, parent: i64, sort: i32) -> Menu {
        Menu {
            id: MenuId(id),
            parent_id: MenuId(parent),
            title: format!("menu-{}", id),
            menu_type: MenuType::Menu,
            path: Some(format!("/m{}", id)),
            name: None,
            component: None,
            redirect: None,
            icon: None,
            is_external: false,
            is_cache: false,
            is_hidden: false,
            permission: None,
            sort,
            status: EnableStatus::Enabled,
        }
    }

    fn ids(nodes: &[RouteNode]) -> Vec<i64> {
        nodes.iter().map(|n| n.id.0).collect()
    }

    #[test]
    fn test_tree_by_parent_with_sorting() {
        let menus = vec![
            menu(1000, 0, 2),
            menu(2000, 0, 1),
            menu(1020, 1000, 2),
            menu(1010, 1000, 1),
            menu(1011, 1010, 1),
        ];
        let tree = build_route_tree(&menus);
        assert_eq!(ids(&tree), vec![2000, 1000]);
        assert_eq!(ids(&tree[1].children), vec![1010, 1020]);
        assert_eq!(ids(&tree[1].children[0].children), vec![1011]);
    }

    #[test]
    fn test_duplicates_collapse() {
        let a = menu(1, 0, 1);
        let b = menu(2, 1, 1);
        let tree = build_route_tree([&a, &b, &a, &b]);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].children.len(), 1);
    }

    #[test]
    fn test_orphan_becomes_root() {
        let menus = vec![menu(1, 0, 1), menu(5, 99, 0)];
        let tree = build_route_tree(&menus);
        assert_eq!(ids(&tree), vec![5, 1]);
    }

    #[test]
    fn test_cycle_does_not_loop() {
        let menus = vec![menu(1, 2, 1), menu(2, 1, 1), menu(3, 0, 1)];
        let tree = build_route_tree(&menus);
        assert_eq!(ids(&tree), vec![3]);
    }

    #[test]
    fn test_blank_permission_is_ignored() {
        let mut m = menu(1, 0, 1);
        m.permission = Some("  ".to_string());
        assert_eq!(m.permission_code(), None);
        m.permission = Some("system:user:list".to_string());
        assert_eq!(m.permission_code(), Some("system:user:list"));
    }
}
