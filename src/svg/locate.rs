//! Element lookup by `id`.

use super::tree::Element;

/// Depth-first, pre-order search for the element whose `id` equals `id`.
///
/// The node itself is checked before its children, children are visited in
/// document order, and the first match wins when ids are duplicated.
pub fn find_by_id<'a>(root: &'a Element, id: &str) -> Option<&'a Element> {
    find_path_by_id(root, id).and_then(|path| root.descend(&path))
}

/// Like [`find_by_id`], but returns the element-child index path from `root`.
///
/// An empty path means `root` itself matched.
pub fn find_path_by_id(root: &Element, id: &str) -> Option<Vec<usize>> {
    let mut path = Vec::new();
    search(root, id, &mut path).then_some(path)
}

fn search(elem: &Element, id: &str, path: &mut Vec<usize>) -> bool {
    if elem.id() == Some(id) {
        return true;
    }

    for (index, child) in elem.elements().enumerate() {
        path.push(index);
        if search(child, id, path) {
            return true;
        }
        path.pop();
    }

    false
}
