use crate::constants::DEFAULT_TIME_LIMIT_MS;
use crate::model::problem::{Difficulty, Problem, TestCase};

struct SeedProblem {
    id: u32,
    title: &'static str,
    difficulty: Difficulty,
    category: &'static str,
    description: &'static str,
    example: &'static str,
    constraints: &'static [&'static str],
    starter_code: &'static str,
    // (input, expected_output, hidden)
    cases: &'static [(&'static str, &'static str, bool)],
}

const SEEDS: [SeedProblem; 5] = [
    SeedProblem {
        id: 1,
        title: "Two Sum",
        difficulty: Difficulty::Easy,
        category: "Arrays",
        description: "Given an array of integers 'nums' and an integer 'target', return indices of the two numbers such that they add up to target.",
        example: "Input: nums = [2,7,11,15], target = 9\nOutput: [0,1]\nExplanation: Because nums[0] + nums[1] == 9, we return [0, 1].",
        constraints: &[
            "2 ≤ nums.length ≤ 10^4",
            "-10^9 ≤ nums[i] ≤ 10^9",
            "-10^9 ≤ target ≤ 10^9",
            "Only one valid answer exists.",
        ],
        starter_code: "function twoSum(nums, target) {\n  // Write your code here\n  \n}\n",
        cases: &[
            ("2 7 11 15\n9", "0 1", false),
            ("3 2 4\n6", "1 2", false),
            ("3 3\n6", "0 1", true),
        ],
    },
    SeedProblem {
        id: 2,
        title: "Reverse String",
        difficulty: Difficulty::Easy,
        category: "Strings",
        description: "Write a function that reverses a string. The input string is given as an array of characters.",
        example: "Input: s = ['h','e','l','l','o']\nOutput: ['o','l','l','e','h']",
        constraints: &[
            "1 ≤ s.length ≤ 10^5",
            "s[i] is a printable ascii character.",
            "Do it in-place with O(1) extra memory.",
        ],
        starter_code: "function reverseString(s) {\n  // Write your code here\n  \n}\n",
        cases: &[
            ("hello", "olleh", false),
            ("Hannah", "hannaH", false),
            ("a", "a", true),
        ],
    },
    SeedProblem {
        id: 3,
        title: "Merge Sorted Arrays",
        difficulty: Difficulty::Medium,
        category: "Arrays",
        description: "Given two sorted arrays nums1 and nums2, merge nums2 into nums1 as one sorted array.",
        example: "Input: nums1 = [1,2,3,0,0,0], m = 3, nums2 = [2,5,6], n = 3\nOutput: [1,2,2,3,5,6]",
        constraints: &[
            "nums1.length == m + n",
            "nums2.length == n",
            "0 ≤ m, n ≤ 200",
            "1 ≤ m + n ≤ 200",
        ],
        starter_code: "function merge(nums1, m, nums2, n) {\n  // Write your code here\n  \n}\n",
        cases: &[
            ("1 2 3\n2 5 6", "1 2 2 3 5 6", false),
            ("1\n", "1", false),
            ("4 5 6\n1 2 3", "1 2 3 4 5 6", true),
        ],
    },
    SeedProblem {
        id: 4,
        title: "Binary Search Tree Validator",
        difficulty: Difficulty::Hard,
        category: "Trees",
        description: "Given the root of a binary tree, determine if it is a valid binary search tree (BST).",
        example: "Input: root = [2,1,3]\nOutput: true\n\nInput: root = [5,1,4,null,null,3,6]\nOutput: false",
        constraints: &[
            "The number of nodes in the tree is in the range [1, 10^4].",
            "-2^31 ≤ Node.val ≤ 2^31 - 1",
        ],
        starter_code: "function isValidBST(root) {\n  // Write your code here\n  \n}\n",
        cases: &[
            ("2 1 3", "true", false),
            ("5 1 4 null null 3 6", "false", false),
            ("5 4 6 null null 3 7", "false", true),
        ],
    },
    SeedProblem {
        id: 5,
        title: "Container With Most Water",
        difficulty: Difficulty::Medium,
        category: "Arrays",
        description: "Given n non-negative integers where each represents a vertical line at coordinate i, find two lines which together with the x-axis form a container that holds the most water.",
        example: "Input: height = [1,8,6,2,5,4,8,3,7]\nOutput: 49",
        constraints: &["n == height.length", "2 ≤ n ≤ 10^5", "0 ≤ height[i] ≤ 10^4"],
        starter_code: "function maxArea(height) {\n  // Write your code here\n  \n}\n",
        cases: &[
            ("1 8 6 2 5 4 8 3 7", "49", false),
            ("1 1", "1", false),
            ("4 3 2 1 4", "16", true),
        ],
    },
];

/// The built-in catalogue, ids 1..=5. These can never be edited or deleted.
pub fn seed_problems() -> Vec<Problem> {
    SEEDS
        .iter()
        .map(|s| {
            let mut p = Problem {
                id: s.id,
                title: s.title.to_string(),
                difficulty: s.difficulty,
                category: s.category.to_string(),
                description: s.description.to_string(),
                example: s.example.to_string(),
                constraints: s.constraints.iter().map(|c| c.to_string()).collect(),
                starter_code: s.starter_code.to_string(),
                passkey: String::new(),
                test_cases: s
                    .cases
                    .iter()
                    .map(|(i, o, hidden)| TestCase {
                        input: i.to_string(),
                        expected_output: o.to_string(),
                        hidden: *hidden,
                    })
                    .collect(),
                time_limit_ms: DEFAULT_TIME_LIMIT_MS,
            };
            p.normalize();
            p
        })
        .collect()
}

pub fn is_seed_id(id: u32) -> bool {
    SEEDS.iter().any(|s| s.id == id)
}
